use chrono::NaiveDate;
use serde::Deserialize;

/// One `user_books` row as the API returns it: the join between the user,
/// a book, a reading status, and an optionally pinned edition.
#[derive(Debug, Clone, Deserialize)]
pub struct UserBook {
    pub id: Option<i64>,
    pub book_id: Option<i64>,
    pub status_id: Option<i64>,
    pub edition_id: Option<i64>,
    pub privacy_setting_id: Option<i64>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_book_reads: Option<Vec<UserBookRead>>,
    pub book: Option<Book>,
    pub edition: Option<Edition>,
}

/// A single reading-log row. Reads are requested ordered by id ascending;
/// "latest" always means maximum id, never maximum date, because ids are
/// monotonic while dates may be absent.
#[derive(Debug, Clone, Deserialize)]
pub struct UserBookRead {
    pub id: Option<i64>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub progress_pages: Option<i64>,
    pub edition_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Book {
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub contributions: Option<Vec<Contribution>>,
    pub image: Option<CoverImage>,
    #[serde(default)]
    pub editions: Option<Vec<Edition>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contribution {
    pub author: Option<Author>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverImage {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edition {
    pub id: i64,
    pub title: Option<String>,
    pub isbn_10: Option<String>,
    pub isbn_13: Option<String>,
    pub pages: Option<i64>,
    pub publisher: Option<Publisher>,
    pub image: Option<CoverImage>,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Publisher {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl Edition {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown Edition")
    }

    /// Publisher and page count, joined for one-line display.
    pub fn display_info(&self) -> String {
        let mut info: Vec<String> = Vec::new();
        if let Some(name) = self.publisher.as_ref().and_then(|p| p.name.as_deref()) {
            info.push(name.to_string());
        }
        if let Some(pages) = self.pages {
            info.push(format!("{} pages", pages));
        }
        info.join(", ")
    }
}

impl Book {
    /// First contribution's author name; the rest are translators,
    /// narrators and the like.
    pub fn primary_author(&self) -> Option<&str> {
        self.contributions
            .as_deref()?
            .first()?
            .author
            .as_ref()?
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
    }
}

impl UserBook {
    pub fn display_title(&self) -> Option<&str> {
        if let Some(title) = self
            .edition
            .as_ref()
            .and_then(|e| e.title.as_deref())
            .filter(|t| !t.is_empty())
        {
            return Some(title);
        }
        self.book.as_ref().map(|b| b.title.as_str())
    }

    /// Edition cover wins over the book cover; empty URLs are ignored.
    pub fn cover_url(&self) -> Option<&str> {
        let edition_url = self
            .edition
            .as_ref()
            .and_then(|e| e.image.as_ref())
            .and_then(|i| i.url.as_deref())
            .filter(|u| !u.is_empty());
        edition_url.or_else(|| {
            self.book
                .as_ref()
                .and_then(|b| b.image.as_ref())
                .and_then(|i| i.url.as_deref())
                .filter(|u| !u.is_empty())
        })
    }

    /// The last read (by id) that carries a page count, else 0.
    pub fn current_page(&self) -> i64 {
        self.user_book_reads
            .as_deref()
            .unwrap_or_default()
            .iter()
            .rev()
            .find_map(|r| r.progress_pages)
            .unwrap_or(0)
    }
}

/// Flat, render-ready snapshot of one in-progress book. Built fresh each
/// sync cycle and discarded after the next; nothing keys off it between
/// refreshes except the opaque id string.
#[derive(Debug, Clone)]
pub struct ProgressRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover: Option<Vec<u8>>,
    /// Fraction in [0, 1]; `current_page / total_pages` when the page
    /// count is known.
    pub progress: f64,
    /// 0 means unknown.
    pub total_pages: i64,
    pub current_page: i64,
    pub book_id: Option<i64>,
    pub user_book_id: Option<i64>,
    pub edition_id: Option<i64>,
    /// The book's own title, even when an edition title is displayed.
    pub canonical_title: String,
}

impl ProgressRecord {
    /// Normalize one user-book row. Returns `None` when the book payload
    /// is missing, which skips the row without failing the batch.
    pub fn from_user_book(user_book: &UserBook) -> Option<Self> {
        let book = user_book.book.as_ref()?;
        let title = user_book.display_title().unwrap_or(&book.title).to_string();
        let author = book.primary_author().unwrap_or("Unknown Author").to_string();

        let total_pages = user_book
            .edition
            .as_ref()
            .and_then(|e| e.pages)
            .unwrap_or(0);
        let current_page = user_book.current_page();
        let progress = if total_pages > 0 {
            current_page as f64 / total_pages as f64
        } else {
            0.0
        };

        Some(Self {
            id: user_book.id.unwrap_or(0).to_string(),
            title,
            author,
            cover: None,
            progress,
            total_pages,
            current_page,
            book_id: book.id,
            user_book_id: user_book.id,
            edition_id: user_book.edition_id,
            canonical_title: book.title.clone(),
        })
    }
}

/// One row of the finished-books history.
#[derive(Debug, Clone)]
pub struct FinishedEntry {
    pub id: i64,
    pub book_id: i64,
    pub user_book_id: Option<i64>,
    pub title: String,
    pub author: String,
    pub rating: Option<f64>,
    pub finished_at: NaiveDate,
    pub cover: Option<Vec<u8>>,
}

/// Aggregate numbers over all finished books.
#[derive(Debug, Clone)]
pub struct ReadingStats {
    pub from_date: String,
    pub to_date: String,
    pub books_finished: i64,
    pub estimated_pages: i64,
    pub average_rating: Option<f64>,
}

/// Search result after hydration: enough to show a pickable row.
#[derive(Debug, Clone, Deserialize)]
pub struct HydratedBook {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub contributions: Option<Vec<Contribution>>,
    pub image: Option<CoverImage>,
}

impl HydratedBook {
    pub fn primary_author(&self) -> Option<&str> {
        self.contributions
            .as_deref()?
            .first()?
            .author
            .as_ref()?
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeUser {
    pub id: i64,
    pub username: String,
}
