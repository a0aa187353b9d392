use std::sync::Mutex;
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use sha2::{Digest, Sha256};
use url::Url;

/// Thumbnails never exceed this on their longest side.
pub const MAX_PIXEL: u32 = 120;
/// Re-encode quality for cached thumbnails.
pub const JPEG_QUALITY: u8 = 60;
/// Cache bounds; both are enforced at all times.
pub const MAX_ENTRIES: usize = 8;
pub const MAX_TOTAL_BYTES: usize = 3 * 1024 * 1024;

/// Fetches cover images, downsamples them to widget-sized thumbnails and
/// keeps the results in a small bounded cache keyed by source URL.
///
/// Every failure mode (bad URL, network error, undecodable payload) is a
/// `None`, never an error: a missing cover must not sink the batch that
/// asked for it. The cache is cleared at the start of each
/// currently-reading sync so one refresh cycle's book set bounds the
/// memory and no thumbnail outlives the set it belongs to.
pub struct CoverStore {
    client: reqwest::Client,
    cache: Mutex<CoverCache>,
}

impl CoverStore {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("pageturn/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            cache: Mutex::new(CoverCache::new()),
        }
    }

    pub async fn thumbnail(&self, url: &str) -> Option<Vec<u8>> {
        let key = cache_key(url);
        if let Some(hit) = self.cache.lock().unwrap().get(&key) {
            return Some(hit);
        }

        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!(url, error = %e, "skipping invalid cover URL");
                return None;
            }
        };

        let bytes = match self.download(parsed).await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(url, error = %e, "cover download failed");
                return None;
            }
        };

        let thumb = make_thumbnail(&bytes)?;
        self.cache.lock().unwrap().insert(key, thumb.clone());
        Some(thumb)
    }

    pub fn clear(&self) {
        self.cache.lock().unwrap().clear();
    }

    pub fn entry_count(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    async fn download(&self, url: Url) -> reqwest::Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for CoverStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode, constrain to [`MAX_PIXEL`] on the longest side, re-encode as
/// JPEG. The full-size decode result is dropped before anything is
/// cached; only the thumbnail bytes survive.
pub fn make_thumbnail(bytes: &[u8]) -> Option<Vec<u8>> {
    let img = match image::load_from_memory(bytes) {
        Ok(i) => i,
        Err(e) => {
            tracing::debug!(error = %e, "cover bytes are not a decodable image");
            return None;
        }
    };
    // thumbnail() scales up as well as down; images already inside the
    // budget are re-encoded as-is.
    let thumb = if img.width() > MAX_PIXEL || img.height() > MAX_PIXEL {
        img.thumbnail(MAX_PIXEL, MAX_PIXEL).to_rgb8()
    } else {
        img.to_rgb8()
    };

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    if let Err(e) = thumb.write_with_encoder(encoder) {
        tracing::debug!(error = %e, "thumbnail encode failed");
        return None;
    }
    Some(out)
}

fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recency-ordered bounded store: most recently used at the back.
/// Eviction drops from the front until both the entry and byte budgets
/// hold.
struct CoverCache {
    entries: Vec<(String, Vec<u8>)>,
    total_bytes: usize,
}

impl CoverCache {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            total_bytes: 0,
        }
    }

    fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(pos);
        let bytes = entry.1.clone();
        self.entries.push(entry);
        Some(bytes)
    }

    fn insert(&mut self, key: String, bytes: Vec<u8>) {
        if bytes.len() > MAX_TOTAL_BYTES {
            tracing::warn!(cost = bytes.len(), "thumbnail larger than the whole cache budget, not caching");
            return;
        }
        if let Some(pos) = self.entries.iter().position(|(k, _)| k == &key) {
            let (_, old) = self.entries.remove(pos);
            self.total_bytes -= old.len();
        }
        self.total_bytes += bytes.len();
        self.entries.push((key, bytes));
        while self.entries.len() > MAX_ENTRIES || self.total_bytes > MAX_TOTAL_BYTES {
            let (_, evicted) = self.entries.remove(0);
            self.total_bytes -= evicted.len();
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
