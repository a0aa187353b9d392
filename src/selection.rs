use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;

use crate::hardcover::HardcoverClient;

/// How long a cached entity listing stays fresh.
pub const CACHE_TTL: Duration = Duration::from_secs(60);

/// How many releases to offer in a picker: enough for selection plus the
/// largest display surface.
const RELEASE_CHOICES: usize = 30;

/// A pickable entity: just enough to render a row in a chooser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub id: String,
    pub title: String,
}

/// The one typed, user-displayable failure the engine lets past its
/// boundary: "nothing there" after a forced refresh, which is a different
/// statement than an empty list from a transient failure.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No books found. Make sure your Currently Reading list is not empty.")]
    NoBooksFound,
    #[error("No upcoming releases found. Only future editions from your Want to Read list are shown.")]
    NoReleasesFound,
}

/// TTL cache around one entity listing. The slot lock is held across the
/// refetch so "check freshness, else refetch and store" is atomic: two
/// concurrent callers produce one upstream fetch, never a racing pair.
pub struct SnapshotCache<T> {
    slot: Mutex<Option<(Vec<T>, Instant)>>,
    ttl: Duration,
}

impl<T: Clone> SnapshotCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Vec<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<T>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some((items, stored_at)) = slot.as_ref() {
            if stored_at.elapsed() < self.ttl {
                return items.clone();
            }
        }
        let items = refresh().await;
        *slot = Some((items.clone(), Instant::now()));
        items
    }

    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }
}

/// Entity listings for the selection UI, cached process-wide so a burst
/// of picker queries doesn't hammer the API.
pub struct Selection {
    books: SnapshotCache<EntityRef>,
    releases: SnapshotCache<EntityRef>,
}

impl Selection {
    pub fn new() -> Self {
        Self {
            books: SnapshotCache::new(CACHE_TTL),
            releases: SnapshotCache::new(CACHE_TTL),
        }
    }

    /// Books to offer in a picker. An empty first answer forces one fresh
    /// fetch; still empty means the typed error, not an empty list.
    pub async fn suggested_books(
        &self,
        client: &HardcoverClient,
    ) -> Result<Vec<EntityRef>, SelectionError> {
        let books = self.books_refreshed_once(client).await;
        if books.is_empty() {
            Err(SelectionError::NoBooksFound)
        } else {
            Ok(books)
        }
    }

    pub async fn suggested_releases(
        &self,
        client: &HardcoverClient,
    ) -> Result<Vec<EntityRef>, SelectionError> {
        let releases = self.releases_refreshed_once(client).await;
        if releases.is_empty() {
            Err(SelectionError::NoReleasesFound)
        } else {
            Ok(releases)
        }
    }

    /// Resolve previously picked identifiers, preserving their order.
    pub async fn books_for_ids(&self, client: &HardcoverClient, ids: &[String]) -> Vec<EntityRef> {
        order_by_ids(self.books_refreshed_once(client).await, ids)
    }

    pub async fn releases_for_ids(
        &self,
        client: &HardcoverClient,
        ids: &[String],
    ) -> Vec<EntityRef> {
        order_by_ids(self.releases_refreshed_once(client).await, ids)
    }

    pub async fn default_book(&self, client: &HardcoverClient) -> Option<EntityRef> {
        self.cached_books(client).await.into_iter().next()
    }

    pub async fn default_release(&self, client: &HardcoverClient) -> Option<EntityRef> {
        self.cached_releases(client).await.into_iter().next()
    }

    pub async fn clear(&self) {
        self.books.clear().await;
        self.releases.clear().await;
    }

    async fn books_refreshed_once(&self, client: &HardcoverClient) -> Vec<EntityRef> {
        let books = self.cached_books(client).await;
        if !books.is_empty() {
            return books;
        }
        self.books.clear().await;
        self.cached_books(client).await
    }

    async fn releases_refreshed_once(&self, client: &HardcoverClient) -> Vec<EntityRef> {
        let releases = self.cached_releases(client).await;
        if !releases.is_empty() {
            return releases;
        }
        self.releases.clear().await;
        self.cached_releases(client).await
    }

    async fn cached_books(&self, client: &HardcoverClient) -> Vec<EntityRef> {
        self.books
            .get_or_refresh(|| async {
                client
                    .fetch_currently_reading()
                    .await
                    .into_iter()
                    .map(|b| EntityRef {
                        id: b.id,
                        title: b.title,
                    })
                    .collect()
            })
            .await
    }

    async fn cached_releases(&self, client: &HardcoverClient) -> Vec<EntityRef> {
        self.releases
            .get_or_refresh(|| async {
                client
                    .fetch_upcoming_releases(RELEASE_CHOICES)
                    .await
                    .into_iter()
                    .map(|r| EntityRef {
                        id: r.edition_id.to_string(),
                        title: r.title,
                    })
                    .collect()
            })
            .await
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

fn order_by_ids(entities: Vec<EntityRef>, ids: &[String]) -> Vec<EntityRef> {
    let mut picked: Vec<EntityRef> = entities
        .into_iter()
        .filter(|e| ids.contains(&e.id))
        .collect();
    picked.sort_by_key(|e| ids.iter().position(|id| id == &e.id).unwrap_or(usize::MAX));
    picked
}
