//! Persisted login session.
//!
//! The original storage scheme was a single ambient `"user"` key written on
//! login and read once at startup, with no way to clear it. This is the
//! explicit replacement: a session object with defined creation, load, and
//! invalidation operations, stored as one JSON file under the platform
//! config directory.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const APP_DIR: &str = "kingshelf";
const SESSION_FILE: &str = "user.json";

/// A logged-in user, as much of one as the auth service tells us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    /// Opaque payload returned by the auth service on login. Never
    /// interpreted, only round-tripped through storage.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// On-disk store holding at most one [`Session`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store rooted at the platform config directory. `None` when the
    /// platform reports no such directory.
    pub fn open_default() -> Option<Self> {
        let dir = dirs::config_dir()?;
        Some(Self::new(dir.join(APP_DIR).join(SESSION_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create and persist a new session for `username`. Replaces any
    /// existing session.
    pub fn create(
        &self,
        username: &str,
        payload: serde_json::Value,
    ) -> io::Result<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            username: username.to_string(),
            payload,
            created_at: Utc::now(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&session)?;
        std::fs::write(&self.path, content)?;
        tracing::info!(username, "session created");
        Ok(session)
    }

    /// Load the persisted session, if any. An unreadable or malformed file
    /// counts as "not logged in" rather than an error.
    pub fn load(&self) -> Option<Session> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::warn!(%err, "discarding malformed session file");
                None
            }
        }
    }

    /// Delete the persisted session. Idempotent: a missing file is fine.
    pub fn invalidate(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("session invalidated");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}
