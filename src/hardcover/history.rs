use serde::Deserialize;
use serde_json::json;

use super::HardcoverClient;
use crate::domain::book::{Book, Edition};
use crate::domain::dates::parse_date;
use crate::domain::{FinishedEntry, ReadingStats};

const HISTORY_QUERY: &str = "query ReadingHistory($userId: Int!, $limit: Int!, $offset: Int!) {
  user_book_reads(
    where: { finished_at: { _is_null: false }, user_book: { user_id: { _eq: $userId } } },
    order_by: [{ finished_at: desc }, { id: desc }],
    limit: $limit,
    offset: $offset
  ) {
    id
    finished_at
    edition_id
    user_book {
      id
      book_id
      rating
      book { id title contributions { author { name } } image { url } }
      edition { id title image { url } }
    }
  }
}";

const STATS_QUERY: &str = "query ReadingStats($userId: Int!) {
  user_books(where: { user_id: { _eq: $userId }, status_id: { _eq: 3 } }) {
    id
    rating
    edition { pages }
  }
}";

#[derive(Deserialize)]
struct HistoryData {
    user_book_reads: Option<Vec<HistoryRead>>,
}

#[derive(Deserialize)]
struct HistoryRead {
    id: Option<i64>,
    finished_at: Option<String>,
    user_book: Option<HistoryUserBook>,
}

#[derive(Deserialize)]
struct HistoryUserBook {
    id: Option<i64>,
    book_id: Option<i64>,
    rating: Option<f64>,
    book: Option<Book>,
    edition: Option<Edition>,
}

#[derive(Deserialize)]
struct StatsData {
    user_books: Option<Vec<StatsRow>>,
}

#[derive(Deserialize)]
struct StatsRow {
    rating: Option<f64>,
    edition: Option<StatsEdition>,
}

#[derive(Deserialize)]
struct StatsEdition {
    pages: Option<i64>,
}

impl HardcoverClient {
    /// Finished books, newest first. Rows missing their id, date or book
    /// are skipped; the rest of the page is unaffected.
    pub async fn fetch_reading_history(&self, limit: i64, offset: i64) -> Vec<FinishedEntry> {
        if !self.ensure_authenticated() {
            return Vec::new();
        }
        let Some(user_id) = self.fetch_user_id().await else {
            return Vec::new();
        };

        let data = match self
            .graphql
            .execute_as::<HistoryData>(
                HISTORY_QUERY,
                json!({"userId": user_id, "limit": limit, "offset": offset}),
            )
            .await
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "reading history query failed");
                return Vec::new();
            }
        };

        let reads = data.user_book_reads.unwrap_or_default();
        let mut entries = Vec::with_capacity(reads.len());
        for read in &reads {
            let Some(entry) = Self::history_entry(read) else {
                tracing::debug!(id = ?read.id, "skipping malformed history row");
                continue;
            };
            let mut entry = entry;
            if let Some(url) = Self::history_cover_url(read) {
                entry.cover = self.covers.thumbnail(url).await;
            }
            entries.push(entry);
        }
        entries
    }

    fn history_entry(read: &HistoryRead) -> Option<FinishedEntry> {
        let id = read.id?;
        let finished_at = parse_date(read.finished_at.as_deref()?)?;
        let user_book = read.user_book.as_ref()?;
        let book_id = user_book.book_id?;
        let book = user_book.book.as_ref();

        let edition_title = user_book
            .edition
            .as_ref()
            .and_then(|e| e.title.as_deref())
            .filter(|t| !t.is_empty());
        let title = edition_title
            .or(book.map(|b| b.title.as_str()))
            .unwrap_or("Unknown Title")
            .to_string();
        let author = book
            .and_then(|b| b.primary_author())
            .unwrap_or("Unknown Author")
            .to_string();

        Some(FinishedEntry {
            id,
            book_id,
            user_book_id: user_book.id,
            title,
            author,
            rating: user_book.rating,
            finished_at,
            cover: None,
        })
    }

    fn history_cover_url(read: &HistoryRead) -> Option<&str> {
        let user_book = read.user_book.as_ref()?;
        user_book
            .edition
            .as_ref()
            .and_then(|e| e.image.as_ref())
            .and_then(|i| i.url.as_deref())
            .filter(|u| !u.is_empty())
            .or_else(|| {
                user_book
                    .book
                    .as_ref()
                    .and_then(|b| b.image.as_ref())
                    .and_then(|i| i.url.as_deref())
                    .filter(|u| !u.is_empty())
            })
    }

    /// Aggregates over every finished book. The server keeps no proper
    /// per-year rollup, so the window is the full account history; the
    /// `year` parameter is accepted for interface parity and currently
    /// ignored.
    pub async fn fetch_reading_stats(&self, _year: Option<i32>) -> Option<ReadingStats> {
        if !self.ensure_authenticated() {
            return None;
        }
        let user_id = self.fetch_user_id().await?;

        let data = match self
            .graphql
            .execute_as::<StatsData>(STATS_QUERY, json!({"userId": user_id}))
            .await
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "reading stats query failed");
                return None;
            }
        };

        let rows = data.user_books?;
        let books_finished = rows.len() as i64;
        let estimated_pages = rows
            .iter()
            .map(|r| r.edition.as_ref().and_then(|e| e.pages).unwrap_or(0).max(0))
            .sum();
        let ratings: Vec<f64> = rows.iter().filter_map(|r| r.rating).collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        };

        Some(ReadingStats {
            from_date: "1900-01-01".into(),
            to_date: "2999-01-01".into(),
            books_finished,
            estimated_pages,
            average_rating,
        })
    }
}
