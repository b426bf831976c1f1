//! Durable JSON file token storage (feature-gated).
//!
//! The file holds a single object with optional `access` and `refresh`
//! keys. Every write goes to a uniquely named sibling temp file, created
//! owner-only, which then replaces the session file. Clearing both slots
//! deletes the file.

use std::{
    env,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use facelog_core::{StoreError, TokenPair, TokenSlot, TokenStore};
use tokio::{fs, sync::Mutex};

/// Environment variable overriding the session file location.
pub const SESSION_FILE_VAR: &str = "FACELOG_SESSION_FILE";

/// File storage implementation.
///
/// Survives restarts; the session ends only on logout or a failed refresh.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create a store at [`default_path`](Self::default_path).
    ///
    /// # Errors
    /// Returns error if no data directory can be determined.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::default_path()
            .map(Self::new)
            .ok_or_else(|| StoreError::Internal("no data directory available".to_string()))
    }

    /// `$FACELOG_SESSION_FILE`, or `<data dir>/facelog/session.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = env::var_os(SESSION_FILE_VAR).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        dirs::data_dir().map(|dir| dir.join("facelog").join("session.json"))
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<TokenPair, StoreError> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TokenPair::default()),
            Err(e) => return Err(e.into()),
        };
        let pair: TokenPair = serde_json::from_slice(&content)?;
        // Normalize empty strings written by other tools.
        Ok(TokenPair::new(pair.access, pair.refresh))
    }

    async fn save(&self, pair: &TokenPair) -> Result<(), StoreError> {
        if pair.is_empty() {
            return match fs::remove_file(&self.path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await?;

        let contents = serde_json::to_vec_pretty(pair)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_private(&dir, &path, &contents))
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))??;
        tracing::debug!(path = %self.path.display(), "Saved session file");
        Ok(())
    }

    async fn update(&self, f: impl FnOnce(&mut TokenPair) + Send) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut pair = self.load().await?;
        f(&mut pair);
        self.save(&pair).await
    }
}

// NamedTempFile is created with mode 0600 on unix.
fn write_private(dir: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

#[async_trait]
impl TokenStore for FileStore {
    async fn get(&self, slot: TokenSlot) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.get(slot).map(ToOwned::to_owned))
    }

    async fn set(&self, slot: TokenSlot, value: &str) -> Result<(), StoreError> {
        let value = value.to_string();
        self.update(move |pair| pair.set(slot, Some(value))).await
    }

    async fn remove(&self, slot: TokenSlot) -> Result<(), StoreError> {
        self.update(|pair| pair.set(slot, None)).await
    }

    async fn set_pair(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
        let next = TokenPair::new(Some(access.to_string()), Some(refresh.to_string()));
        self.update(move |pair| *pair = next).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.update(|pair| *pair = TokenPair::default()).await
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_err;

    use super::*;

    #[tokio::test]
    async fn test_tokens_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileStore::new(&path).set_pair("a", "r").await.unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(TokenSlot::Access).await.unwrap().as_deref(), Some("a"));
        assert_eq!(reopened.get(TokenSlot::Refresh).await.unwrap().as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn test_replacing_access_keeps_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        store.set_pair("a", "r").await.unwrap();

        store.set(TokenSlot::Access, "a2").await.unwrap();
        assert_eq!(store.get(TokenSlot::Access).await.unwrap().as_deref(), Some("a2"));
        assert_eq!(store.get(TokenSlot::Refresh).await.unwrap().as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        store.set_pair("a", "r").await.unwrap();
        assert!(store.path().exists());

        store.clear().await.unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.get(TokenSlot::Refresh).await.unwrap(), None);

        // Clearing twice is fine.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get(TokenSlot::Access).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = FileStore::new(&path);
        assert_err!(store.get(TokenSlot::Access).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        store.set_pair("a", "r").await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_concurrent_writers_leave_a_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        // Separate instances share no lock, like two processes would.
        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = FileStore::new(&path);
                tokio::spawn(async move { store.set_pair(&format!("a{i}"), "r").await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let store = FileStore::new(&path);
        assert!(store.get(TokenSlot::Access).await.unwrap().is_some());
        assert_eq!(store.get(TokenSlot::Refresh).await.unwrap().as_deref(), Some("r"));
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
