//! Login session passed explicitly to whatever needs the user or token

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Authenticated user as returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub token: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Shared handle to the current session.
///
/// Set at login, cleared at logout. When created with a path, every change
/// is mirrored to that JSON file so the next run starts logged in.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    current: Arc<RwLock<Option<Session>>>,
    path: Option<PathBuf>,
}

impl SessionContext {
    /// In-memory context, starts logged out
    pub fn new() -> Self {
        Self::default()
    }

    /// Context backed by a file; restores a saved session if one exists
    pub fn persistent(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let restored = Self::restore(&path)?;
        if restored.is_some() {
            log::debug!("restored session from {}", path.display());
        }
        Ok(Self {
            current: Arc::new(RwLock::new(restored)),
            path: Some(path),
        })
    }

    pub fn login(&self, session: Session) -> Result<(), CoreError> {
        if let Some(path) = &self.path {
            Self::save(path, &session)?;
        }
        log::info!("logged in as {}", session.username);
        *self.write()? = Some(session);
        Ok(())
    }

    pub fn logout(&self) -> Result<(), CoreError> {
        let previous = self.write()?.take();
        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        if let Some(session) = previous {
            log::info!("logged out {}", session.username);
        }
        Ok(())
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().ok().and_then(|s| s.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Option<Session>>, CoreError> {
        self.current.write().map_err(|_| CoreError::Session {
            message: "session lock poisoned".to_string(),
        })
    }

    /// Write a session as pretty JSON, creating parent directories
    pub fn save(path: &Path, session: &Session) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session).map_err(|e| CoreError::Session {
            message: e.to_string(),
        })?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a saved session; a missing file means logged out
    pub fn restore(path: &Path) -> Result<Option<Session>, CoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CoreError::Session {
                message: format!("{}: {}", path.display(), e),
            })
    }
}
