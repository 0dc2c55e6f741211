//! Session store implementations
//!
//! The persisted layout mirrors the three flat entries of the browser-era
//! storage: access token, refresh token, serialized user record. They are
//! written and cleared together; no other component touches the file.

use serde::{Deserialize, Serialize};
use skybook_core::{
    ErrorContext, Session, SessionStore, SkybookError, SkybookResult, UserRecord,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedSession {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserRecord>,
}

/// JSON-file-backed session store
pub struct FileSessionStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl FileSessionStore {
    /// Create a store over the given file path. The file is created lazily
    /// on the first write.
    pub fn new<P: AsRef<Path>>(path: P) -> SkybookResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SkybookError::Storage {
                message: format!("Failed to create session directory: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("session_store")
                    .with_operation("create_dir")
                    .with_suggestion("Check permissions on the storage directory"),
            })?;
        }

        info!("Session store initialized at {}", path.display());

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    fn load(&self) -> SkybookResult<PersistedSession> {
        if !self.path.exists() {
            return Ok(PersistedSession::default());
        }

        let data = std::fs::read_to_string(&self.path).map_err(|e| SkybookError::Storage {
            message: format!("Failed to read session file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("session_store").with_operation("read_file"),
        })?;

        serde_json::from_str(&data).map_err(|e| SkybookError::Storage {
            message: format!("Session file is corrupt: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("session_store")
                .with_operation("parse_json")
                .with_suggestion("Delete the session file and log in again"),
        })
    }

    fn save(&self, persisted: &PersistedSession) -> SkybookResult<()> {
        let data = serde_json::to_string_pretty(persisted)?;

        std::fs::write(&self.path, data).map_err(|e| SkybookError::Storage {
            message: format!("Failed to write session file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("session_store").with_operation("write_file"),
        })?;

        debug!("Session file updated at {}", self.path.display());
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn access_token(&self) -> SkybookResult<Option<String>> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.load()?.access_token)
    }

    fn refresh_token(&self) -> SkybookResult<Option<String>> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.load()?.refresh_token)
    }

    fn user(&self) -> SkybookResult<Option<UserRecord>> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.load()?.user)
    }

    fn store_session(&self, session: &Session) -> SkybookResult<()> {
        let _guard = self.lock.lock().unwrap();
        self.save(&PersistedSession {
            access_token: Some(session.access_token.clone()),
            refresh_token: Some(session.refresh_token.clone()),
            user: Some(session.user.clone()),
        })
    }

    fn replace_access_token(&self, access_token: &str) -> SkybookResult<()> {
        let _guard = self.lock.lock().unwrap();
        let mut persisted = self.load()?;
        persisted.access_token = Some(access_token.to_string());
        self.save(&persisted)
    }

    fn clear(&self) -> SkybookResult<()> {
        let _guard = self.lock.lock().unwrap();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Session file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SkybookError::Storage {
                message: format!("Failed to remove session file: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("session_store").with_operation("clear"),
            }),
        }
    }
}

/// In-memory session store for tests and throwaway sessions
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<PersistedSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn access_token(&self) -> SkybookResult<Option<String>> {
        Ok(self.inner.lock().unwrap().access_token.clone())
    }

    fn refresh_token(&self) -> SkybookResult<Option<String>> {
        Ok(self.inner.lock().unwrap().refresh_token.clone())
    }

    fn user(&self) -> SkybookResult<Option<UserRecord>> {
        Ok(self.inner.lock().unwrap().user.clone())
    }

    fn store_session(&self, session: &Session) -> SkybookResult<()> {
        *self.inner.lock().unwrap() = PersistedSession {
            access_token: Some(session.access_token.clone()),
            refresh_token: Some(session.refresh_token.clone()),
            user: Some(session.user.clone()),
        };
        Ok(())
    }

    fn replace_access_token(&self, access_token: &str) -> SkybookResult<()> {
        self.inner.lock().unwrap().access_token = Some(access_token.to_string());
        Ok(())
    }

    fn clear(&self) -> SkybookResult<()> {
        *self.inner.lock().unwrap() = PersistedSession::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybook_core::Role;
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            user: UserRecord {
                id: Uuid::new_v4(),
                email: "amelia@example.com".to_string(),
                first_name: "Amelia".to_string(),
                last_name: "Earhart".to_string(),
                role: Role::Client,
                created_at: None,
            },
        }
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json")).unwrap();

        assert!(store.access_token().unwrap().is_none());

        let session = session();
        store.store_session(&session).unwrap();

        assert_eq!(store.access_token().unwrap().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-1"));
        assert_eq!(store.user().unwrap().unwrap().email, session.user.email);
    }

    #[test]
    fn test_replace_access_token_keeps_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json")).unwrap();

        store.store_session(&session()).unwrap();
        store.replace_access_token("access-2").unwrap();

        assert_eq!(store.access_token().unwrap().as_deref(), Some("access-2"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-1"));
        assert!(store.user().unwrap().is_some());
    }

    #[test]
    fn test_clear_removes_all_entries_together() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json")).unwrap();

        store.store_session(&session()).unwrap();
        store.clear().unwrap();

        assert!(store.access_token().unwrap().is_none());
        assert!(store.refresh_token().unwrap().is_none());
        assert!(store.user().unwrap().is_none());

        // Clearing an already-empty store must not fail
        store.clear().unwrap();
    }

    #[test]
    fn test_memory_store_mirrors_file_semantics() {
        let store = MemorySessionStore::new();
        store.store_session(&session()).unwrap();
        store.replace_access_token("access-2").unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("access-2"));

        store.clear().unwrap();
        assert!(store.refresh_token().unwrap().is_none());
    }
}
