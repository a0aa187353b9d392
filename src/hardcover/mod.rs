pub mod goals;
pub mod history;
pub mod mutations;
pub mod reading;
pub mod releases;
pub mod search;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{normalize_username, Settings};
use crate::covers::CoverStore;
use crate::domain::{MeUser, UserBook};
use crate::graphql::value::pluck_i64;
use crate::graphql::{GraphQLClient, Transport};

/// Hardcover's fixed reading-status ids.
pub const STATUS_WANT_TO_READ: i64 = 1;
pub const STATUS_CURRENTLY_READING: i64 = 2;
pub const STATUS_FINISHED: i64 = 3;

/// The engine's public surface. Every operation is total: it returns a
/// value or an explicit empty/absent result, and never lets transport,
/// GraphQL or decode failures escape past it. The only exception lives
/// in [`crate::selection`].
pub struct HardcoverClient {
    pub(crate) graphql: GraphQLClient,
    pub(crate) covers: Arc<CoverStore>,
    pub(crate) settings: Settings,
}

impl HardcoverClient {
    pub fn new(settings: Settings, transport: Arc<dyn Transport>, covers: Arc<CoverStore>) -> Self {
        Self {
            graphql: GraphQLClient::new(transport),
            covers,
            settings,
        }
    }

    /// Unauthenticated operations short-circuit before any request goes
    /// out.
    pub(crate) fn ensure_authenticated(&self) -> bool {
        if self.settings.is_authenticated() {
            true
        } else {
            tracing::warn!("no API key configured");
            false
        }
    }

    /// The authenticated user, or `None` on any failure.
    pub async fn fetch_me(&self) -> Option<MeUser> {
        if !self.ensure_authenticated() {
            return None;
        }

        #[derive(Deserialize)]
        struct MeData {
            me: Option<Vec<MeUser>>,
        }

        match self
            .graphql
            .execute_as::<MeData>("{ me { id username } }", Value::Null)
            .await
        {
            Ok(data) => data.me.and_then(|mut users| {
                if users.is_empty() {
                    None
                } else {
                    Some(users.remove(0))
                }
            }),
            Err(e) => {
                tracing::warn!(error = %e, "me query failed");
                None
            }
        }
    }

    /// The account's username with display decorations stripped.
    pub async fn fetch_username(&self) -> Option<String> {
        self.fetch_me()
            .await
            .map(|user| normalize_username(&user.username))
            .filter(|u| !u.is_empty())
    }

    pub(crate) async fn fetch_user_id(&self) -> Option<i64> {
        let id = self.fetch_me().await.map(|user| user.id);
        if id.is_none() {
            tracing::warn!("could not resolve the authenticated user id");
        }
        id
    }

    /// One user-book row by id, used by mutations that need the current
    /// book/status/privacy before writing.
    pub(crate) async fn fetch_user_book(&self, user_book_id: i64) -> Option<UserBook> {
        #[derive(Deserialize)]
        struct UserBooksData {
            user_books: Option<Vec<UserBook>>,
        }

        let query = "query GetUserBook($id: Int!) {
          user_books(where: { id: { _eq: $id }}) {
            id
            book_id
            status_id
            edition_id
            privacy_setting_id
            rating
          }
        }";

        match self
            .graphql
            .execute_as::<UserBooksData>(query, json!({"id": user_book_id}))
            .await
        {
            Ok(data) => data.user_books.and_then(|mut rows| {
                if rows.is_empty() {
                    None
                } else {
                    Some(rows.remove(0))
                }
            }),
            Err(e) => {
                tracing::warn!(user_book_id, error = %e, "user_book lookup failed");
                None
            }
        }
    }

    /// The account-level default privacy setting, used when a user-book
    /// row doesn't carry its own.
    pub(crate) async fn fetch_account_privacy(&self) -> Option<i64> {
        match self
            .graphql
            .execute("{ me { account_privacy_setting_id } }", Value::Null)
            .await
        {
            Ok(data) => data
                .get("me")
                .and_then(Value::as_array)
                .and_then(|users| users.first())
                .and_then(|user| pluck_i64(user, "account_privacy_setting_id")),
            Err(e) => {
                tracing::warn!(error = %e, "privacy setting lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::HardcoverClient;
    use crate::config::Settings;
    use crate::covers::CoverStore;
    use crate::graphql::testing::ScriptedTransport;

    pub fn client(transport: ScriptedTransport) -> (HardcoverClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let settings = Settings {
            api_key: "test-key".into(),
            ..Default::default()
        };
        let client = HardcoverClient::new(settings, transport.clone(), Arc::new(CoverStore::new()));
        (client, transport)
    }

    pub fn unauthenticated_client() -> HardcoverClient {
        HardcoverClient::new(
            Settings::default(),
            Arc::new(ScriptedTransport::new()),
            Arc::new(CoverStore::new()),
        )
    }

    pub fn me_response() -> serde_json::Value {
        serde_json::json!({"data": {"me": [{"id": 77, "username": "@reader"}]}})
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use crate::graphql::testing::ScriptedTransport;

    #[tokio::test]
    async fn test_fetch_me() {
        let (client, _) = client(ScriptedTransport::new().on("{ me { id username } }", me_response()));
        let me = client.fetch_me().await.unwrap();
        assert_eq!(me.id, 77);
        assert_eq!(client.fetch_username().await.as_deref(), Some("reader"));
    }

    #[tokio::test]
    async fn test_unauthenticated_sends_nothing() {
        let client = unauthenticated_client();
        assert!(client.fetch_me().await.is_none());
    }

    #[tokio::test]
    async fn test_me_graphql_error_is_none() {
        let (client, _) = client(ScriptedTransport::new().on(
            "{ me { id username } }",
            serde_json::json!({"errors": [{"message": "invalid token"}]}),
        ));
        assert!(client.fetch_me().await.is_none());
    }
}
