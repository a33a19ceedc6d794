//! Object storage for report artifacts.
//!
//! Keys are slash-separated paths such as `reports/daily/2024-01-02.json`.
//! The local store maps them onto a directory tree.

use super::PublishError;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Destination for report artifacts.
pub trait ObjectStore {
    /// Store `body` under `key`, replacing any previous object.
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), PublishError>;

    /// URL a reader can use to fetch the object at `key`.
    fn url_for(&self, key: &str) -> String;
}

/// Object store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path under the root, rejecting keys that escape it.
    fn object_path(&self, key: &str) -> Result<PathBuf, PublishError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));

        if key.is_empty() || escapes {
            return Err(PublishError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), PublishError> {
        let path = self.object_path(key)?;
        let store_error = |source| PublishError::Store {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(store_error)?;
        }
        fs::write(&path, body).map_err(store_error)?;

        debug!(key, content_type, bytes = body.len(), "Stored object");
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        // Canonicalize so the URL is absolute even for a relative root
        let root = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        format!("file://{}", root.join(key).display())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_creates_nested_keys() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store
            .put("reports/daily/2024-01-02.json", b"{}", JSON_CONTENT_TYPE)
            .unwrap();

        let written = fs::read(dir.path().join("reports/daily/2024-01-02.json")).unwrap();
        assert_eq!(written, b"{}");
    }

    #[test]
    fn test_put_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put("a.json", b"1", JSON_CONTENT_TYPE).unwrap();
        store.put("a.json", b"2", JSON_CONTENT_TYPE).unwrap();

        assert_eq!(fs::read(dir.path().join("a.json")).unwrap(), b"2");
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        for key in ["../outside.json", "/etc/passwd", ""] {
            let err = store.put(key, b"x", JSON_CONTENT_TYPE).unwrap_err();
            assert!(matches!(err, PublishError::InvalidKey(_)), "key {:?}", key);
        }
    }

    #[test]
    fn test_url_for_is_absolute_file_url() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        let url = store.url_for("reports/daily/2024-01-02.json");
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("reports/daily/2024-01-02.json"));
    }
}
