use chrono::Utc;
use serde_json::json;

use super::reading::UserBooksData;
use super::HardcoverClient;
use crate::domain::release::upcoming_from_entries;
use crate::domain::UpcomingRelease;

const WANT_TO_READ_QUERY: &str = "query WantToRead($userId: Int!) {
  user_books(
    where: { user_id: { _eq: $userId }, status_id: { _eq: 1 } },
    order_by: { id: desc }
  ) {
    id
    book_id
    edition_id
    edition { id title pages release_date image { url } }
    book {
      id
      title
      contributions { author { name } }
      image { url }
      editions { id title pages release_date image { url } }
    }
  }
}";

impl HardcoverClient {
    /// Upcoming releases from the want-to-read list: per entry the pinned
    /// edition's future release date, else the earliest future date among
    /// the book's editions; sorted soonest-first and capped at `limit`.
    /// Covers are fetched only for entries that survive the cap.
    pub async fn fetch_upcoming_releases(&self, limit: usize) -> Vec<UpcomingRelease> {
        if !self.ensure_authenticated() {
            return Vec::new();
        }
        let Some(user_id) = self.fetch_user_id().await else {
            return Vec::new();
        };

        let data = match self
            .graphql
            .execute_as::<UserBooksData>(WANT_TO_READ_QUERY, json!({"userId": user_id}))
            .await
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "want-to-read query failed");
                return Vec::new();
            }
        };

        let entries = data.user_books.unwrap_or_default();
        let today = Utc::now().date_naive();
        let mut releases = upcoming_from_entries(&entries, today, limit);
        tracing::debug!(
            entries = entries.len(),
            upcoming = releases.len(),
            "selected upcoming releases"
        );

        for release in &mut releases {
            if let Some(url) = release.cover_url.as_deref() {
                release.cover = self.covers.thumbnail(url).await;
            }
        }
        releases
    }
}
