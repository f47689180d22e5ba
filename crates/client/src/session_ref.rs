use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

use exam_core::model::SessionId;

/// Errors surfaced by session reference stores.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("store lock poisoned")]
    Lock,
}

/// Durable client-local reference to the current session.
///
/// One key, one value: the session id. Presence of the key is what gates
/// whether the session page proceeds or redirects, so `clear` must run on
/// submit, exit, and back-to-home.
pub trait SessionRefStore: Send + Sync {
    /// Read the stored session id, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on storage failures.
    fn load(&self) -> Result<Option<SessionId>, StoreError>;

    /// Persist the session id, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on storage failures.
    fn save(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Remove the stored reference. Clearing an empty store is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on storage failures.
    fn clear(&self) -> Result<(), StoreError>;
}

/// File-backed store: the id as a single trimmed line.
pub struct FileSessionRefStore {
    path: PathBuf,
}

impl FileSessionRefStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionRefStore for FileSessionRefStore {
    fn load(&self) -> Result<Option<SessionId>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SessionId::new(trimmed)))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, id: &SessionId) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{}\n", id.as_str()))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct InMemorySessionRefStore {
    slot: Mutex<Option<SessionId>>,
}

impl InMemorySessionRefStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(id: SessionId) -> Self {
        Self {
            slot: Mutex::new(Some(id)),
        }
    }
}

impl SessionRefStore for InMemorySessionRefStore {
    fn load(&self) -> Result<Option<SessionId>, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Lock)?;
        Ok(slot.clone())
    }

    fn save(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Lock)?;
        *slot = Some(id.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Lock)?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionRefStore::new(dir.path().join("session"));

        assert_eq!(store.load().unwrap(), None);

        let id = SessionId::new("abc-123");
        store.save(&id).unwrap();
        assert_eq!(store.load().unwrap(), Some(id));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing again is fine.
        store.clear().unwrap();
    }

    #[test]
    fn file_store_trims_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        std::fs::write(&path, "  s-42 \n").unwrap();

        let store = FileSessionRefStore::new(path);
        assert_eq!(store.load().unwrap(), Some(SessionId::new("s-42")));
    }

    #[test]
    fn in_memory_store_round_trips() {
        let store = InMemorySessionRefStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save(&SessionId::new("x")).unwrap();
        assert_eq!(store.load().unwrap(), Some(SessionId::new("x")));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
