use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::app::{PageturnError, Result};

fn default_true() -> bool {
    true
}

/// Settings loaded from `~/.config/pageturn/config.toml`.
///
/// The API key and username are stored as the user typed them; use
/// [`Settings::api_key`] and [`Settings::username`] for the normalized
/// values that actually go on the wire.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub username: String,
    /// Reconcile book-goal progress against the finished-read count.
    #[serde(default = "default_true")]
    pub self_heal_goals: bool,
    /// Count every finished read toward a book goal, rereads included.
    /// When false, only unique books count.
    #[serde(default = "default_true")]
    pub count_rereads: bool,
}

impl Settings {
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| PageturnError::Config(e.to_string()))
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pageturn").join("config.toml"))
    }

    /// Normalized API key; empty means unauthenticated.
    pub fn api_key(&self) -> String {
        normalize_api_key(&self.api_key)
    }

    /// Normalized username; empty means unknown.
    pub fn username(&self) -> String {
        normalize_username(&self.username)
    }

    pub fn is_authenticated(&self) -> bool {
        !self.api_key().is_empty()
    }

    /// `Authorization` header value, or `None` when no key is configured.
    pub fn bearer_token(&self) -> Option<String> {
        let key = self.api_key();
        if key.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", key))
        }
    }
}

/// Strip the decorations users paste along with their API key: an
/// `Authorization:` prefix, a `Bearer` prefix (both case-insensitive),
/// and surrounding double quotes. Idempotent.
pub fn normalize_api_key(key: &str) -> String {
    let mut k = key.trim();
    if let Some(rest) = strip_prefix_ignore_case(k, "authorization:") {
        k = rest.trim();
    }
    if let Some(rest) = strip_prefix_ignore_case(k, "bearer ") {
        k = rest.trim();
    }
    if k.len() >= 2 && k.starts_with('"') && k.ends_with('"') {
        k = &k[1..k.len() - 1];
    }
    k.to_string()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}

/// Usernames are stored without the leading `@`.
pub fn normalize_username(username: &str) -> String {
    let u = username.trim();
    u.strip_prefix('@').unwrap_or(u).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_plain_key() {
        assert_eq!(normalize_api_key("abc123"), "abc123");
    }

    #[test]
    fn test_normalize_strips_prefixes_and_quotes() {
        assert_eq!(normalize_api_key("Authorization: Bearer \"abc\""), "abc");
        assert_eq!(normalize_api_key("AUTHORIZATION: bearer abc"), "abc");
        assert_eq!(normalize_api_key("Bearer abc"), "abc");
        assert_eq!(normalize_api_key("  \"abc\"  "), "abc");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["Authorization: Bearer \"abc\"", "bearer xyz", "plain", "  spaced  "] {
            let once = normalize_api_key(raw);
            assert_eq!(normalize_api_key(&once), once);
        }
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("@reader"), "reader");
        assert_eq!(normalize_username(" reader "), "reader");
        assert_eq!(normalize_username(""), "");
    }

    #[test]
    fn test_bearer_token() {
        let settings = Settings {
            api_key: "Bearer tok".into(),
            ..Default::default()
        };
        assert_eq!(settings.bearer_token().as_deref(), Some("Bearer tok"));

        let empty = Settings::default();
        assert!(empty.bearer_token().is_none());
        assert!(!empty.is_authenticated());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"abc\"\nusername = \"@reader\"\ncount_rereads = false").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.api_key(), "abc");
        assert_eq!(settings.username(), "reader");
        assert!(settings.self_heal_goals);
        assert!(!settings.count_rereads);
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = [").unwrap();
        assert!(Settings::from_file(file.path()).is_err());
    }
}
