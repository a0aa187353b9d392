use serde_json::{json, Map, Value};

use super::{HardcoverClient, STATUS_CURRENTLY_READING, STATUS_FINISHED};
use crate::domain::dates::today_utc_string;
use crate::graphql::value::{mutation_ok, pluck, pluck_i64};

const INSERT_USER_BOOK: &str = "mutation InsertUserBook($object: UserBookCreateInput!) {
  insert_user_book(object: $object) {
    error
    user_book { id book_id edition_id status_id privacy_setting_id }
  }
}";

const INSERT_READ: &str = "mutation InsertUserBookRead($id: Int!, $pages: Int, $editionId: Int, $startedAt: date) {
  insert_user_book_read(user_book_id: $id, user_book_read: {
    progress_pages: $pages,
    edition_id: $editionId,
    started_at: $startedAt,
  }) {
    error
    user_book_read { id progress_pages edition_id started_at finished_at }
  }
}";

const INSERT_FINISHED_READ: &str = "mutation InsertFinishedRead($id: Int!, $pages: Int, $editionId: Int, $finishedAt: date) {
  insert_user_book_read(user_book_id: $id, user_book_read: {
    progress_pages: $pages,
    edition_id: $editionId,
    finished_at: $finishedAt
  }) {
    error
    user_book_read { id progress_pages edition_id started_at finished_at }
  }
}";

const UPDATE_USER_BOOK: &str = "mutation UpdateUserBook($id: Int!, $object: UserBookUpdateInput!) {
  update_user_book(id: $id, object: $object) {
    error
    user_book { id status_id rating }
  }
}";

const UPDATE_RATING: &str = "mutation UpdateRating($id: Int!, $rating: float8) {
  update_user_book(id: $id, object: { rating: $rating }) {
    error
    user_book { id rating }
  }
}";

const DELETE_USER_BOOK: &str = "mutation DeleteUserBook($id: Int!) {
  delete_user_book(id: $id) { id }
}";

const LATEST_READ: &str = "query LatestRead($id: Int!) {
  user_book_reads(where: { user_book_id: { _eq: $id } }, order_by: { id: desc }, limit: 1) {
    id
    finished_at
  }
}";

const STAMP_FINISHED: &str = "mutation StampFinished($id: Int!, $finished: date) {
  update_user_book_read(id: $id, object: { finished_at: $finished }) {
    error
    user_book_read { id finished_at }
  }
}";

const RETARGET_READ: &str = "mutation RetargetRead($id: Int!, $edition: Int!) {
  update_user_book_read(id: $id, object: { edition_id: $edition }) {
    error
    user_book_read { id edition_id }
  }
}";

/// Ratings are half stars between 0.5 and 5.0; anything else is snapped
/// to the nearest legal value.
pub fn clamp_rating(rating: f64) -> f64 {
    ((rating * 2.0).round() / 2.0).clamp(0.5, 5.0)
}

impl HardcoverClient {
    /// Put a book on the currently-reading shelf, optionally pinning an
    /// edition. Privacy follows the account default.
    pub async fn add_book(&self, book_id: i64, edition_id: Option<i64>) -> bool {
        if !self.ensure_authenticated() {
            return false;
        }

        let privacy = self.fetch_account_privacy().await.unwrap_or(1);
        let mut object = Map::new();
        object.insert("book_id".into(), json!(book_id));
        object.insert("status_id".into(), json!(STATUS_CURRENTLY_READING));
        object.insert("privacy_setting_id".into(), json!(privacy));
        if let Some(eid) = edition_id {
            object.insert("edition_id".into(), json!(eid));
        }

        self.mutate(INSERT_USER_BOOK, json!({"object": object}), "insert_user_book", "user_book")
            .await
    }

    /// Pin a different edition on an existing user-book. The server
    /// upserts on re-insert, so the row keeps its status and privacy;
    /// afterwards the latest read is retargeted at the new edition on a
    /// best-effort basis; that follow-up failing does not fail the
    /// operation.
    pub async fn update_edition(&self, user_book_id: i64, edition_id: i64) -> bool {
        if !self.ensure_authenticated() {
            return false;
        }

        let Some(user_book) = self.fetch_user_book(user_book_id).await else {
            tracing::warn!(user_book_id, "cannot change edition: user_book not found");
            return false;
        };
        let Some(book_id) = user_book.book_id else {
            tracing::warn!(user_book_id, "cannot change edition: row has no book_id");
            return false;
        };
        let status = user_book.status_id.unwrap_or(STATUS_CURRENTLY_READING);
        let privacy = match user_book.privacy_setting_id {
            Some(p) => p,
            None => self.fetch_account_privacy().await.unwrap_or(1),
        };

        let object = json!({
            "book_id": book_id,
            "edition_id": edition_id,
            "status_id": status,
            "privacy_setting_id": privacy
        });
        let ok = self
            .mutate(INSERT_USER_BOOK, json!({"object": object}), "insert_user_book", "user_book")
            .await;
        if ok {
            let _ = self.retarget_latest_read(user_book_id, edition_id).await;
        }
        ok
    }

    /// Log a page-progress read. The edition is resolved from the
    /// user-book when not supplied; `started_at` is stamped with today's
    /// UTC date.
    pub async fn insert_read(&self, user_book_id: i64, page: i64, edition_id: Option<i64>) -> bool {
        if !self.ensure_authenticated() {
            return false;
        }
        if page < 0 {
            tracing::warn!(user_book_id, page, "refusing to log a negative page");
            return false;
        }

        let edition_id = match edition_id {
            Some(eid) => Some(eid),
            None => self
                .fetch_user_book(user_book_id)
                .await
                .and_then(|ub| ub.edition_id),
        };

        let mut variables = Map::new();
        variables.insert("id".into(), json!(user_book_id));
        variables.insert("pages".into(), json!(page));
        variables.insert("startedAt".into(), json!(today_utc_string()));
        if let Some(eid) = edition_id {
            variables.insert("editionId".into(), json!(eid));
        }

        self.mutate(INSERT_READ, Value::Object(variables), "insert_user_book_read", "user_book_read")
            .await
    }

    pub async fn update_status(&self, user_book_id: i64, status_id: i64) -> bool {
        self.update_user_book(user_book_id, status_id, None).await
    }

    /// Status and rating in one mutation; the rating key is omitted when
    /// `None` so an existing rating is never cleared by accident.
    pub async fn update_user_book(
        &self,
        user_book_id: i64,
        status_id: i64,
        rating: Option<f64>,
    ) -> bool {
        if !self.ensure_authenticated() {
            return false;
        }

        let mut object = Map::new();
        object.insert("status_id".into(), json!(status_id));
        if let Some(r) = rating {
            object.insert("rating".into(), json!(r));
        }

        self.mutate(
            UPDATE_USER_BOOK,
            json!({"id": user_book_id, "object": object}),
            "update_user_book",
            "user_book",
        )
        .await
    }

    /// Set or clear (with `None`) the rating on a user-book.
    pub async fn update_rating(&self, user_book_id: i64, rating: Option<f64>) -> bool {
        if !self.ensure_authenticated() {
            return false;
        }
        self.mutate(
            UPDATE_RATING,
            json!({"id": user_book_id, "rating": rating}),
            "update_user_book",
            "user_book",
        )
        .await
    }

    pub async fn delete_book(&self, user_book_id: i64) -> bool {
        if !self.ensure_authenticated() {
            return false;
        }
        match self.graphql.execute(DELETE_USER_BOOK, json!({"id": user_book_id})).await {
            Ok(data) => pluck_i64(&data, "delete_user_book.id").is_some(),
            Err(e) => {
                tracing::warn!(user_book_id, error = %e, "delete_user_book failed");
                false
            }
        }
    }

    /// The finish-book workflow: mark the book finished (with the rating,
    /// when given, in the same mutation), then make sure exactly one read
    /// carries today's finish date: preferably by stamping the most
    /// recent existing read, and only when that fails by inserting a new
    /// read carrying the page count.
    pub async fn finish_book(
        &self,
        user_book_id: i64,
        edition_id: Option<i64>,
        total_pages: Option<i64>,
        current_page: Option<i64>,
        rating: Option<f64>,
    ) -> bool {
        if !self.ensure_authenticated() {
            return false;
        }

        let status_ok = self
            .update_user_book(user_book_id, STATUS_FINISHED, rating.map(clamp_rating))
            .await;
        if !status_ok {
            tracing::warn!(user_book_id, "finish_book: status update failed");
            return false;
        }

        let today = today_utc_string();
        let mut finished_ok = false;
        if let Some(read_id) = self.latest_read_id(user_book_id).await {
            finished_ok = self.stamp_finished(read_id, &today).await;
        }
        if !finished_ok {
            let pages = total_pages.or(current_page);
            finished_ok = self
                .insert_finished_read(user_book_id, edition_id, pages, &today)
                .await;
        }
        if !finished_ok {
            tracing::warn!(user_book_id, "finish_book: could not set a finished date");
        }
        finished_ok
    }

    async fn latest_read_id(&self, user_book_id: i64) -> Option<i64> {
        match self.graphql.execute(LATEST_READ, json!({"id": user_book_id})).await {
            Ok(data) => pluck(&data, "user_book_reads")
                .and_then(Value::as_array)
                .and_then(|reads| reads.first())
                .and_then(|read| pluck_i64(read, "id")),
            Err(e) => {
                tracing::warn!(user_book_id, error = %e, "latest read lookup failed");
                None
            }
        }
    }

    async fn stamp_finished(&self, read_id: i64, finished_at: &str) -> bool {
        self.mutate(
            STAMP_FINISHED,
            json!({"id": read_id, "finished": finished_at}),
            "update_user_book_read",
            "user_book_read",
        )
        .await
    }

    async fn insert_finished_read(
        &self,
        user_book_id: i64,
        edition_id: Option<i64>,
        pages: Option<i64>,
        finished_at: &str,
    ) -> bool {
        let mut variables = Map::new();
        variables.insert("id".into(), json!(user_book_id));
        variables.insert("finishedAt".into(), json!(finished_at));
        if let Some(p) = pages {
            variables.insert("pages".into(), json!(p.max(0)));
        }
        if let Some(eid) = edition_id {
            variables.insert("editionId".into(), json!(eid));
        }

        self.mutate(
            INSERT_FINISHED_READ,
            Value::Object(variables),
            "insert_user_book_read",
            "user_book_read",
        )
        .await
    }

    async fn retarget_latest_read(&self, user_book_id: i64, edition_id: i64) -> bool {
        let Some(read_id) = self.latest_read_id(user_book_id).await else {
            return false;
        };
        self.mutate(
            RETARGET_READ,
            json!({"id": read_id, "edition": edition_id}),
            "update_user_book_read",
            "user_book_read",
        )
        .await
    }

    /// Execute one mutation and apply the shared success check.
    async fn mutate(&self, mutation: &str, variables: Value, op: &str, result_key: &str) -> bool {
        match self.graphql.execute(mutation, variables).await {
            Ok(data) => mutation_ok(&data, op, result_key),
            Err(e) => {
                tracing::warn!(op, error = %e, "mutation failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::graphql::testing::ScriptedTransport;

    fn ok_update_user_book() -> Value {
        json!({"data": {"update_user_book": {"error": null, "user_book": {"id": 1, "status_id": 3}}}})
    }

    fn ok_read_mutation(op: &str) -> Value {
        let mut data = Map::new();
        data.insert(op.into(), json!({"error": null, "user_book_read": {"id": 5}}));
        json!({"data": data})
    }

    #[test]
    fn test_clamp_rating() {
        assert_eq!(clamp_rating(4.6), 4.5);
        assert_eq!(clamp_rating(4.8), 5.0);
        assert_eq!(clamp_rating(0.1), 0.5);
        assert_eq!(clamp_rating(7.0), 5.0);
        assert_eq!(clamp_rating(3.0), 3.0);
    }

    #[tokio::test]
    async fn test_finish_book_stamps_existing_read() {
        let (client, transport) = client(
            ScriptedTransport::new()
                .on("UpdateUserBook", ok_update_user_book())
                .on("LatestRead", json!({"data": {"user_book_reads": [{"id": 5}]}}))
                .on("StampFinished", ok_read_mutation("update_user_book_read")),
        );

        assert!(client.finish_book(1, None, Some(300), None, None).await);
        assert_eq!(transport.sent_matching("StampFinished").len(), 1);
        assert!(transport.sent_matching("InsertFinishedRead").is_empty());
    }

    #[tokio::test]
    async fn test_finish_book_inserts_when_no_read_exists() {
        let (client, transport) = client(
            ScriptedTransport::new()
                .on("UpdateUserBook", ok_update_user_book())
                .on("LatestRead", json!({"data": {"user_book_reads": []}}))
                .on("InsertFinishedRead", ok_read_mutation("insert_user_book_read")),
        );

        assert!(client.finish_book(1, Some(9), Some(300), Some(120), None).await);
        let inserts = transport.sent_matching("InsertFinishedRead");
        assert_eq!(inserts.len(), 1);
        // Total pages win over the current page for the inserted read.
        assert_eq!(inserts[0]["variables"]["pages"], 300);
        assert_eq!(inserts[0]["variables"]["editionId"], 9);
        assert!(inserts[0]["variables"]["finishedAt"].is_string());
    }

    #[tokio::test]
    async fn test_finish_book_falls_back_when_stamp_fails() {
        let (client, transport) = client(
            ScriptedTransport::new()
                .on("UpdateUserBook", ok_update_user_book())
                .on("LatestRead", json!({"data": {"user_book_reads": [{"id": 5}]}}))
                .on("StampFinished", json!({"errors": [{"message": "read is locked"}]}))
                .on("InsertFinishedRead", ok_read_mutation("insert_user_book_read")),
        );

        assert!(client.finish_book(1, None, None, Some(120), None).await);
        assert_eq!(transport.sent_matching("InsertFinishedRead").len(), 1);
    }

    #[tokio::test]
    async fn test_finish_book_sends_clamped_rating_with_status() {
        let (client, transport) = client(
            ScriptedTransport::new()
                .on("UpdateUserBook", ok_update_user_book())
                .on("LatestRead", json!({"data": {"user_book_reads": [{"id": 5}]}}))
                .on("StampFinished", ok_read_mutation("update_user_book_read")),
        );

        assert!(client.finish_book(1, None, None, None, Some(4.6)).await);
        let updates = transport.sent_matching("UpdateUserBook");
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0]["variables"]["object"]["rating"], 4.5);
        assert_eq!(updates[0]["variables"]["object"]["status_id"], 3);
    }

    #[tokio::test]
    async fn test_finish_book_aborts_when_status_update_fails() {
        let (client, transport) = client(
            ScriptedTransport::new()
                .on("UpdateUserBook", json!({"errors": [{"message": "denied"}]})),
        );

        assert!(!client.finish_book(1, None, None, None, None).await);
        assert!(transport.sent_matching("LatestRead").is_empty());
    }

    #[tokio::test]
    async fn test_insert_read_rejects_negative_page() {
        let (client, transport) = client(ScriptedTransport::new());
        assert!(!client.insert_read(1, -3, None).await);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_insert_read_resolves_edition_from_user_book() {
        let (client, transport) = client(
            ScriptedTransport::new()
                .on(
                    "GetUserBook",
                    json!({"data": {"user_books": [{"id": 1, "edition_id": 77}]}}),
                )
                .on("InsertUserBookRead", ok_read_mutation("insert_user_book_read")),
        );

        assert!(client.insert_read(1, 42, None).await);
        let sent = transport.sent_matching("InsertUserBookRead");
        assert_eq!(sent[0]["variables"]["editionId"], 77);
        assert_eq!(sent[0]["variables"]["pages"], 42);
    }

    #[tokio::test]
    async fn test_update_edition_reinserts_and_retargets() {
        let (client, transport) = client(
            ScriptedTransport::new()
                .on(
                    "GetUserBook",
                    json!({"data": {"user_books": [
                        {"id": 1, "book_id": 7, "status_id": 2, "privacy_setting_id": 1}
                    ]}}),
                )
                .on(
                    "InsertUserBook(",
                    json!({"data": {"insert_user_book": {"error": null, "user_book": {"id": 1}}}}),
                )
                .on("LatestRead", json!({"data": {"user_book_reads": [{"id": 3}]}}))
                .on("RetargetRead", ok_read_mutation("update_user_book_read")),
        );

        assert!(client.update_edition(1, 55).await);
        let inserts = transport.sent_matching("InsertUserBook(");
        assert_eq!(inserts[0]["variables"]["object"]["edition_id"], 55);
        assert_eq!(transport.sent_matching("RetargetRead").len(), 1);
    }

    #[tokio::test]
    async fn test_update_edition_survives_retarget_failure() {
        let (client, _) = client(
            ScriptedTransport::new()
                .on(
                    "GetUserBook",
                    json!({"data": {"user_books": [{"id": 1, "book_id": 7}]}}),
                )
                .on(
                    "InsertUserBook(",
                    json!({"data": {"insert_user_book": {"error": null, "user_book": {"id": 1}}}}),
                )
                .on("LatestRead", json!({"data": {"user_book_reads": []}})),
        );
        assert!(client.update_edition(1, 55).await);
    }

    #[tokio::test]
    async fn test_add_book_uses_account_privacy() {
        let (client, transport) = client(
            ScriptedTransport::new()
                .on("account_privacy_setting_id", json!({"data": {"me": [{"account_privacy_setting_id": 2}]}}))
                .on(
                    "InsertUserBook(",
                    json!({"data": {"insert_user_book": {"error": null, "user_book": {"id": 9}}}}),
                ),
        );

        assert!(client.add_book(7, None).await);
        let sent = transport.sent_matching("InsertUserBook(");
        assert_eq!(sent[0]["variables"]["object"]["privacy_setting_id"], 2);
        assert_eq!(sent[0]["variables"]["object"]["status_id"], 2);
    }

    #[tokio::test]
    async fn test_payload_error_string_fails_mutation() {
        let (client, _) = client(ScriptedTransport::new().on(
            "UpdateUserBook",
            json!({"data": {"update_user_book": {"error": "not yours", "user_book": {"id": 1}}}}),
        ));
        assert!(!client.update_status(1, 3).await);
    }

    #[tokio::test]
    async fn test_delete_book() {
        {
            let (client, _) = client(
                ScriptedTransport::new()
                    .on("DeleteUserBook", json!({"data": {"delete_user_book": {"id": 4}}})),
            );
            assert!(client.delete_book(4).await);
        }

        let (client, _) = client(
            ScriptedTransport::new()
                .on("DeleteUserBook", json!({"data": {"delete_user_book": null}})),
        );
        assert!(!client.delete_book(4).await);
    }

    #[tokio::test]
    async fn test_update_rating_clears_with_null() {
        let (client, transport) = client(ScriptedTransport::new().on(
            "UpdateRating",
            json!({"data": {"update_user_book": {"error": null, "user_book": {"id": 1}}}}),
        ));
        assert!(client.update_rating(1, None).await);
        assert!(transport.sent_matching("UpdateRating")[0]["variables"]["rating"].is_null());
    }

    #[tokio::test]
    async fn test_mutations_refuse_without_key() {
        let client = unauthenticated_client();
        assert!(!client.add_book(1, None).await);
        assert!(!client.update_status(1, 3).await);
        assert!(!client.delete_book(1).await);
        assert!(!client.finish_book(1, None, None, None, None).await);
    }
}
