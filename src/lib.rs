//! # Pageturn
//!
//! A sync and reconciliation engine for the Hardcover book-tracking API,
//! built for display surfaces that refresh on a fixed cadence and cannot
//! run background work of their own.
//!
//! ## Architecture
//!
//! Pageturn follows a layered pipeline architecture:
//!
//! ```text
//! Transport → Decoder → Client operations → Covers / Selection → Caller
//! ```
//!
//! - [`graphql`]: signed GraphQL transport with tolerant decoding helpers
//! - [`hardcover`]: the public operations (reading state, goals,
//!   releases, mutations, search, history)
//! - [`covers`]: bounded thumbnail fetch/downsample/cache pipeline
//! - [`selection`]: short-TTL entity cache for picker UIs
//!
//! ## Quick Start
//!
//! ```bash
//! # Show the books you are reading
//! pageturn reading
//!
//! # Reading goals, reconciled against your actual finished count
//! pageturn goals
//!
//! # Upcoming releases from your Want to Read list
//! pageturn upcoming --limit 6
//!
//! # Log progress
//! pageturn log 12345 150
//! ```
//!
//! Every listing operation returns an empty list instead of failing, and
//! every mutation reports a plain boolean; see [`app::PageturnError`] for
//! the one typed exception in the selection path.

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all
/// components: settings, transport, client, caches.
pub mod app;

/// Command-line interface using clap.
///
/// One subcommand per engine operation: `reading`, `goals`, `upcoming`,
/// `history`, `stats`, `search`, plus the write operations.
pub mod cli;

/// Settings and credential normalization.
///
/// Loads from `~/.config/pageturn/config.toml`: API key, username, and
/// the goal-reconciliation flags.
pub mod config;

/// Cover thumbnail pipeline.
///
/// Fetches cover images, downsamples to 120 px, re-encodes as JPEG and
/// caches under strict count/byte bounds.
pub mod covers;

/// Core domain models.
///
/// - [`ProgressRecord`](domain::ProgressRecord): one in-progress book
/// - [`ReadingGoal`](domain::ReadingGoal): tolerant-decoded goal snapshot
/// - [`UpcomingRelease`](domain::UpcomingRelease): future edition pick
pub mod domain;

/// GraphQL transport and decoding.
///
/// - [`Transport`](graphql::Transport): async trait for the wire seam
/// - [`HttpTransport`](graphql::HttpTransport): reqwest implementation
/// - [`decode::FieldReader`](graphql::decode::FieldReader): key-alias and
///   type-coercion tolerant field decoding
pub mod graphql;

/// The Hardcover client: every public engine operation.
pub mod hardcover;

/// Refresh cadence hints returned to the host scheduler as data.
pub mod refresh;

/// Short-TTL snapshot cache and the entity-selection queries.
pub mod selection;
