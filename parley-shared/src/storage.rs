/// Avatar blob storage seam
///
/// Users own at most one avatar. The store only deals in opaque keys; the
/// `users.avatar_key` column is the single source of truth for which blob, if
/// any, belongs to a user. Deletes are idempotent so the remove-avatar
/// operation can be retried safely.
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Error type for avatar storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying I/O failure
    #[error("Avatar storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A key escaped the storage root or was otherwise malformed
    #[error("Invalid avatar key: {0}")]
    InvalidKey(String),
}

/// Generates a fresh opaque key for a new avatar blob
pub fn new_avatar_key() -> String {
    Uuid::new_v4().to_string()
}

/// Stores and deletes avatar blobs by opaque key
#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Writes a blob under `key`, replacing any existing content
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Deletes the blob under `key`; succeeds if the blob never existed
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Filesystem-backed avatar store
///
/// Blobs live as flat files under a configured root directory. Keys are
/// generated by [`new_avatar_key`] and must not contain path separators.
#[derive(Debug, Clone)]
pub struct FsAvatarStore {
    root: PathBuf,
}

impl FsAvatarStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AvatarStore for FsAvatarStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory avatar store, for tests
#[derive(Debug, Default)]
pub struct InMemoryAvatarStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryAvatarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored
    pub fn len(&self) -> usize {
        self.blobs.lock().expect("storage lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a blob exists under `key`
    pub fn contains(&self, key: &str) -> bool {
        self.blobs
            .lock()
            .expect("storage lock poisoned")
            .contains_key(key)
    }
}

#[async_trait]
impl AvatarStore for InMemoryAvatarStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .lock()
            .expect("storage lock poisoned")
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.blobs
            .lock()
            .expect("storage lock poisoned")
            .remove(key);
        Ok(())
    }
}
