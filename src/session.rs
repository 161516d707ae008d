//! Local session file.
//!
//! The session is a small JSON document holding the database URL and the
//! name of the user that is currently logged in:
//!
//! ```json
//! {"db_url": "sqlite://data/gator.db", "current_user_name": "kahya"}
//! ```
//!
//! A missing file means nobody is logged in.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GatorError, Result};

/// Contents of the session file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Database URL; empty means "use the configured one".
    #[serde(default)]
    pub db_url: String,
    /// Name of the logged-in user, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user_name: Option<String>,
}

/// Session bound to a file on disk.
#[derive(Debug, Clone)]
pub struct Session {
    path: PathBuf,
    data: SessionData,
}

impl Session {
    /// Load the session at `path`, or start an empty one if the file is absent.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => SessionData::default(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                GatorError::Session(format!("failed to parse {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session file at {}", path.display());
                SessionData::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, data })
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Database URL recorded in the session, if any.
    pub fn db_url(&self) -> Option<&str> {
        Some(self.data.db_url.as_str()).filter(|url| !url.is_empty())
    }

    /// Name of the logged-in user.
    pub fn current_user_name(&self) -> Option<&str> {
        self.data.current_user_name.as_deref()
    }

    /// Record `name` as the current user and persist the session.
    pub fn set_user(&mut self, name: &str) -> Result<()> {
        self.data.current_user_name = Some(name.to_string());
        self.save()
    }

    /// Write the session back to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&self.data)
            .map_err(|e| GatorError::Session(e.to_string()))?;
        fs::write(&self.path, json)?;
        debug!("Saved session to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session_path(dir: &TempDir) -> PathBuf {
        dir.path().join(".gatorconfig.json")
    }

    #[test]
    fn test_missing_file_is_empty_session() {
        let dir = TempDir::new().unwrap();
        let session = Session::load(session_path(&dir)).unwrap();
        assert!(session.current_user_name().is_none());
        assert!(session.db_url().is_none());
    }

    #[test]
    fn test_load_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = session_path(&dir);
        fs::write(
            &path,
            r#"{"db_url":"sqlite://gator.db","current_user_name":"kahya"}"#,
        )
        .unwrap();

        let session = Session::load(&path).unwrap();
        assert_eq!(session.current_user_name(), Some("kahya"));
        assert_eq!(session.db_url(), Some("sqlite://gator.db"));
    }

    #[test]
    fn test_set_user_persists() {
        let dir = TempDir::new().unwrap();
        let path = session_path(&dir);

        let mut session = Session::load(&path).unwrap();
        session.set_user("holgith").unwrap();

        let reloaded = Session::load(&path).unwrap();
        assert_eq!(reloaded.current_user_name(), Some("holgith"));
    }

    #[test]
    fn test_set_user_keeps_db_url() {
        let dir = TempDir::new().unwrap();
        let path = session_path(&dir);
        fs::write(&path, r#"{"db_url":"sqlite://other.db"}"#).unwrap();

        let mut session = Session::load(&path).unwrap();
        session.set_user("kahya").unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let data: SessionData = serde_json::from_str(&raw).unwrap();
        assert_eq!(data.db_url, "sqlite://other.db");
        assert_eq!(data.current_user_name.as_deref(), Some("kahya"));
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = session_path(&dir);
        fs::write(&path, "{not json").unwrap();

        let result = Session::load(&path);
        assert!(matches!(result, Err(GatorError::Session(_))));
    }
}
