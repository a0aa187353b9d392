use serde::Deserialize;
use serde_json::json;

use super::HardcoverClient;
use crate::domain::{Edition, ProgressRecord, UserBook};

#[derive(Deserialize)]
pub(crate) struct UserBooksData {
    pub user_books: Option<Vec<UserBook>>,
}

#[derive(Deserialize)]
struct EditionsData {
    editions: Option<Vec<Edition>>,
}

const CURRENTLY_READING_QUERY: &str = "query CurrentlyReading($userId: Int!) {
  user_books(
    where: { user_id: { _eq: $userId }, status_id: { _eq: 2 } },
    order_by: { id: desc },
    limit: 10
  ) {
    id
    book_id
    status_id
    edition_id
    privacy_setting_id
    rating
    user_book_reads(order_by: { id: asc }) { id started_at finished_at progress_pages edition_id }
    book { id title contributions { author { name } } image { url } }
    edition { id title isbn_10 isbn_13 pages release_date publisher { name } image { url } }
  }
}";

const EDITIONS_QUERY: &str = "query Editions($bookId: Int!) {
  editions(
    where: {
      book_id: { _eq: $bookId },
      _or: [{ reading_format_id: { _is_null: true } }, { reading_format_id: { _neq: 2 } }]
    },
    order_by: { users_count: desc_nulls_last }
  ) {
    id
    title
    isbn_10
    isbn_13
    pages
    release_date
    publisher { name }
    image { url }
  }
}";

impl HardcoverClient {
    /// The user's in-progress books, newest first, at most ten, each
    /// normalized to a flat [`ProgressRecord`] with a cover thumbnail
    /// where one could be fetched. Failures of any kind yield an empty
    /// list; a malformed row skips just that row.
    pub async fn fetch_currently_reading(&self) -> Vec<ProgressRecord> {
        if !self.ensure_authenticated() {
            return Vec::new();
        }

        // One refresh cycle, one thumbnail set: stale covers from the
        // previous book list must not be served into this one.
        self.covers.clear();

        let Some(user_id) = self.fetch_user_id().await else {
            return Vec::new();
        };

        let data = match self
            .graphql
            .execute_as::<UserBooksData>(CURRENTLY_READING_QUERY, json!({"userId": user_id}))
            .await
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "currently-reading query failed");
                return Vec::new();
            }
        };

        let user_books = data.user_books.unwrap_or_default();
        tracing::debug!(count = user_books.len(), "fetched currently-reading rows");

        let mut records = Vec::with_capacity(user_books.len());
        for user_book in &user_books {
            let Some(mut record) = ProgressRecord::from_user_book(user_book) else {
                tracing::debug!(id = ?user_book.id, "skipping user_book without book payload");
                continue;
            };
            if let Some(url) = user_book.cover_url() {
                record.cover = self.covers.thumbnail(url).await;
            }
            records.push(record);
        }
        records
    }

    /// All print/ebook editions of a book, most popular first. Audiobook
    /// editions are excluded; their page counts are meaningless here.
    pub async fn fetch_editions(&self, book_id: i64) -> Vec<Edition> {
        if !self.ensure_authenticated() {
            return Vec::new();
        }

        match self
            .graphql
            .execute_as::<EditionsData>(EDITIONS_QUERY, json!({"bookId": book_id}))
            .await
        {
            Ok(data) => data.editions.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(book_id, error = %e, "editions query failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::graphql::testing::ScriptedTransport;
    use serde_json::json;

    fn user_books_response() -> serde_json::Value {
        json!({"data": {"user_books": [
            {
                "id": 42,
                "book_id": 7,
                "edition_id": 99,
                "user_book_reads": [
                    {"id": 1, "progress_pages": 100},
                    {"id": 2, "progress_pages": 135}
                ],
                "book": {
                    "id": 7,
                    "title": "The Dispossessed",
                    "contributions": [{"author": {"name": "Ursula K. Le Guin"}}]
                },
                "edition": {"id": 99, "pages": 180}
            },
            // No book payload: skipped, not fatal.
            {"id": 43}
        ]}})
    }

    #[tokio::test]
    async fn test_fetch_currently_reading_normalizes() {
        let (client, _) = client(
            ScriptedTransport::new()
                .on("{ me { id username } }", me_response())
                .on("CurrentlyReading", user_books_response()),
        );

        let records = client.fetch_currently_reading().await;
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.current_page, 135);
        assert_eq!(record.total_pages, 180);
        assert!((record.progress - 0.75).abs() < f64::EPSILON);
        assert!(record.cover.is_none());
    }

    #[tokio::test]
    async fn test_graphql_error_yields_empty_list() {
        let (client, _) = client(
            ScriptedTransport::new()
                .on("{ me { id username } }", me_response())
                .on(
                    "CurrentlyReading",
                    json!({"data": {"user_books": [{"id": 1}]}, "errors": [{"message": "boom"}]}),
                ),
        );
        assert!(client.fetch_currently_reading().await.is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_user_fails_closed(){
        let (client, transport) = client(
            ScriptedTransport::new().on("{ me { id username } }", json!({"data": {"me": []}})),
        );
        assert!(client.fetch_currently_reading().await.is_empty());
        // Only the me query went out.
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_editions() {
        let (client, _) = client(ScriptedTransport::new().on(
            "Editions",
            json!({"data": {"editions": [
                {"id": 1, "title": "Hardcover", "pages": 300},
                {"id": 2, "title": "Paperback", "pages": 280}
            ]}}),
        ));
        let editions = client.fetch_editions(7).await;
        assert_eq!(editions.len(), 2);
        assert_eq!(editions[0].display_title(), "Hardcover");
    }
}
