//! Persistence for the raw session token.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::AuthError;

/// Storage abstraction for the persisted session token.
///
/// Implementations hold one opaque string. The [`SessionManager`] is the
/// only writer; the operations facade never touches the store directly.
///
/// [`SessionManager`]: crate::manager::SessionManager
pub trait SessionStore: Send + Sync {
    fn read(&self) -> Result<Option<String>, AuthError>;
    fn update(&self, raw: &str) -> Result<(), AuthError>;
    fn delete(&self) -> Result<(), AuthError>;
}

/// In-memory store; the session lasts as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self) -> Result<Option<String>, AuthError> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn update(&self, raw: &str) -> Result<(), AuthError> {
        *self.slot.lock().unwrap() = Some(raw.to_string());
        Ok(())
    }

    fn delete(&self) -> Result<(), AuthError> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}

/// File-backed store: one plain-text file holding the raw token.
///
/// A missing file reads as no session, and deleting a missing file is a
/// no-op.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn read(&self) -> Result<Option<String>, AuthError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }

    fn update(&self, raw: &str) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, raw)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn delete(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}
