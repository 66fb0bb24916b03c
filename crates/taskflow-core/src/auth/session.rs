use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::StoreError;

/// Session file name in cache directory
pub const SESSION_FILE: &str = "session.json";

/// The signed-in user as far as the client knows it.
///
/// `id` comes from the access token's claims and is advisory only; the server
/// remains the authority on who the bearer is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
}

/// Client-side authentication state.
///
/// An access token being present is what makes the session authenticated.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .finish()
    }
}

/// Durable persistence for the session.
///
/// `load` never fails: missing or unreadable state is an empty session.
/// `save` must be atomic from the caller's point of view.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Session;
    fn save(&self, session: &Session) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Lets callers keep a handle on a store they also hand to the manager.
impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn load(&self) -> Session {
        (**self).load()
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        (**self).save(session)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

/// Session persisted as a JSON document on disk.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store `session.json` inside the given directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Session {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No session file");
                return Session::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file, starting signed out");
                return Session::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(session) => session,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt session file, starting signed out");
                Session::default()
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;
        let contents = serde_json::to_string_pretty(session)?;

        // Write then rename so readers see either the old or the new document.
        // Each save gets its own temp file; concurrent saves never share one.
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(contents.as_bytes())?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session held only in memory. Useful for tests and short-lived tools.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Session {
        self.session.lock().clone()
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        *self.session.lock() = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.session.lock() = Session::default();
        Ok(())
    }
}
