pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pageturn")]
#[command(about = "Sync your Hardcover reading state from the terminal", long_about = None)]
pub struct Cli {
    /// Path to an alternate config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the books you are currently reading
    Reading,
    /// Show your reading goals
    Goals,
    /// Show upcoming releases from your Want to Read list
    Upcoming {
        /// Maximum number of releases to show
        #[arg(short, long, default_value_t = 6)]
        limit: usize,
    },
    /// Show your finished books, newest first
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
        #[arg(short, long, default_value_t = 0)]
        offset: i64,
    },
    /// Show aggregate reading stats
    Stats {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Search the catalog
    Search {
        title: String,
        #[arg(short, long)]
        author: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },
    /// List the editions of a book
    Editions {
        book_id: i64,
    },
    /// Show the authenticated user
    Whoami,
    /// Add a book to Currently Reading
    Add {
        book_id: i64,
        /// Pin a specific edition
        #[arg(short, long)]
        edition: Option<i64>,
    },
    /// Pin a different edition on a user-book
    SetEdition {
        user_book_id: i64,
        edition_id: i64,
    },
    /// Log a page-progress read
    Log {
        user_book_id: i64,
        page: i64,
        #[arg(short, long)]
        edition: Option<i64>,
    },
    /// Change a user-book's reading status
    Status {
        user_book_id: i64,
        status_id: i64,
    },
    /// Rate a book in half stars; omit the rating to clear it
    Rate {
        user_book_id: i64,
        rating: Option<f64>,
    },
    /// Mark a book finished
    Finish {
        user_book_id: i64,
        #[arg(long)]
        edition: Option<i64>,
        #[arg(long)]
        total_pages: Option<i64>,
        #[arg(long)]
        current_page: Option<i64>,
        #[arg(long)]
        rating: Option<f64>,
    },
    /// Remove a book from your shelves
    Delete {
        user_book_id: i64,
    },
}
