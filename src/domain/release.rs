use chrono::NaiveDate;

use crate::domain::book::{Edition, UserBook};
use crate::domain::dates::parse_date;

/// An edition from the want-to-read list with a release date still ahead
/// of us. Computed fresh on every call; never persisted.
#[derive(Debug, Clone)]
pub struct UpcomingRelease {
    /// Edition id; the identity of the release.
    pub edition_id: i64,
    pub book_id: Option<i64>,
    pub title: String,
    pub author: String,
    pub release_date: NaiveDate,
    pub cover_url: Option<String>,
    pub cover: Option<Vec<u8>>,
}

impl UpcomingRelease {
    /// Per-entry selection: the pinned edition wins when its release date
    /// is today or later; otherwise the earliest future edition of the
    /// underlying book; otherwise the entry contributes nothing.
    pub fn select(user_book: &UserBook, today: NaiveDate) -> Option<Self> {
        let book = user_book.book.as_ref()?;

        let chosen = user_book
            .edition
            .as_ref()
            .and_then(|e| future_date(e, today).map(|d| (e, d)));

        let (edition, release_date) = match chosen {
            Some(hit) => hit,
            None => book
                .editions
                .as_deref()
                .unwrap_or_default()
                .iter()
                .filter_map(|e| future_date(e, today).map(|d| (e, d)))
                .min_by_key(|(_, d)| *d)?,
        };

        let title = edition
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&book.title)
            .to_string();
        let author = book.primary_author().unwrap_or("Unknown Author").to_string();

        let cover_url = edition
            .image
            .as_ref()
            .and_then(|i| i.url.as_deref())
            .filter(|u| !u.is_empty())
            .or_else(|| {
                book.image
                    .as_ref()
                    .and_then(|i| i.url.as_deref())
                    .filter(|u| !u.is_empty())
            })
            .map(String::from);

        Some(Self {
            edition_id: edition.id,
            book_id: book.id,
            title,
            author,
            release_date,
            cover_url,
            cover: None,
        })
    }
}

fn future_date(edition: &Edition, today: NaiveDate) -> Option<NaiveDate> {
    let date = parse_date(edition.release_date.as_deref()?)?;
    (date >= today).then_some(date)
}

/// Apply the per-entry selection across the whole want-to-read list,
/// sorted by release date ascending and truncated to `limit`. Image
/// fetching happens after truncation so discarded candidates never cost
/// a download.
pub fn upcoming_from_entries(
    entries: &[UserBook],
    today: NaiveDate,
    limit: usize,
) -> Vec<UpcomingRelease> {
    let mut releases: Vec<UpcomingRelease> = entries
        .iter()
        .filter_map(|ub| UpcomingRelease::select(ub, today))
        .collect();
    releases.sort_by(|a, b| a.release_date.cmp(&b.release_date).then(a.edition_id.cmp(&b.edition_id)));
    releases.truncate(limit);
    releases
}
