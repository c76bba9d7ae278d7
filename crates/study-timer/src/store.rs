//! Session and settings storage
//!
//! Two JSON files in the data directory:
//! - Sessions: <data_dir>/sessions.json (array, oldest first)
//! - Settings: <data_dir>/settings.json
//!
//! Reads never fail: a missing or unreadable file means "no data". Writes go
//! through a temp file and a rename, so readers see either the old or the new
//! contents.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::session::{Session, Settings};

const SESSIONS_FILE: &str = "sessions.json";
const SETTINGS_FILE: &str = "settings.json";

/// Store-specific errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to create data directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to remove {}: {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },

    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        source: serde_json::Error,
    },
}

/// Persistent store for sessions and settings
#[derive(Debug, Clone)]
pub struct SessionStore {
    data_dir: PathBuf,
}

impl SessionStore {
    /// Open the store, creating the data directory if needed
    pub fn new(data_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir).map_err(|source| StoreError::CreateDir {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn sessions_path(&self) -> PathBuf {
        self.data_dir.join(SESSIONS_FILE)
    }

    fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    /// Append one session and persist the list before returning
    pub fn append(&self, session: &Session) -> Result<(), StoreError> {
        let path = self.sessions_path();

        // A file we cannot read is left alone rather than overwritten. A file
        // we can read but not parse is replaced.
        let mut sessions = match fs::read_to_string(&path) {
            Ok(content) => parse_or_warn::<Vec<Session>>(&path, &content).unwrap_or_default(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        sessions.push(session.clone());
        self.write_json(&path, &sessions, "sessions")?;
        debug!(count = sessions.len(), "Appended session");
        Ok(())
    }

    /// All sessions in creation order, empty if the store is missing or corrupt
    pub fn list_all(&self) -> Vec<Session> {
        self.read_json(&self.sessions_path()).unwrap_or_default()
    }

    /// Settings, or the defaults when absent or malformed
    pub fn load_settings(&self) -> Settings {
        match self.read_json::<Settings>(&self.settings_path()) {
            Some(settings) if settings.total_seconds() > 0 => settings,
            _ => Settings::default(),
        }
    }

    /// Overwrite the stored settings
    pub fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.write_json(&self.settings_path(), settings, "settings")
    }

    /// Replace all sessions and the settings at once
    pub fn restore(&self, sessions: &[Session], settings: &Settings) -> Result<(), StoreError> {
        self.write_json(&self.sessions_path(), &sessions, "sessions")?;
        self.save_settings(settings)
    }

    /// Remove every session and the settings. Irreversible.
    pub fn clear(&self) -> Result<(), StoreError> {
        for path in [self.sessions_path(), self.settings_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Remove { path, source }),
            }
        }
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        match fs::read_to_string(path) {
            Ok(content) => parse_or_warn(path, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(
        &self,
        path: &Path,
        value: &T,
        what: &'static str,
    ) -> Result<(), StoreError> {
        let content = serde_json::to_vec(value)
            .map_err(|source| StoreError::Serialize { what, source })?;

        let tmp = path.with_extension("json.tmp");
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&content)?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        };

        write().map_err(|source| {
            let _ = fs::remove_file(&tmp);
            StoreError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

fn parse_or_warn<T: DeserializeOwned>(path: &Path, content: &str) -> Option<T> {
    if content.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn temp_store() -> (SessionStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        (store, dir)
    }

    fn session(minute: u32, duration: u64, completed: bool) -> Session {
        Session::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
            duration,
            completed,
        )
    }

    #[test]
    fn test_empty_store() {
        let (store, _dir) = temp_store();
        assert!(store.list_all().is_empty());
        assert_eq!(store.load_settings(), Settings::default());
    }

    #[test]
    fn test_append_keeps_creation_order() {
        let (store, _dir) = temp_store();
        let first = session(0, 1500, true);
        let second = session(30, 40, false);

        store.append(&first).unwrap();
        store.append(&second).unwrap();

        assert_eq!(store.list_all(), vec![first, second]);
    }

    #[test]
    fn test_persisted_format() {
        let (store, dir) = temp_store();
        store.append(&session(0, 1500, true)).unwrap();
        store.save_settings(&Settings::new(1, 5)).unwrap();

        let sessions = fs::read_to_string(dir.path().join("sessions.json")).unwrap();
        assert_eq!(
            sessions,
            r#"[{"date":"2024-05-01T10:00:00.000Z","duration":1500,"completed":true}]"#
        );
        let settings = fs::read_to_string(dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, r#"{"hours":1,"minutes":5}"#);
        assert!(!dir.path().join("sessions.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_sessions_read_as_empty() {
        let (store, dir) = temp_store();
        fs::write(dir.path().join("sessions.json"), "[{\"date\": oops").unwrap();
        assert!(store.list_all().is_empty());

        // Appending heals the file
        let fresh = session(5, 60, false);
        store.append(&fresh).unwrap();
        assert_eq!(store.list_all(), vec![fresh]);
    }

    #[test]
    fn test_malformed_settings_fall_back() {
        let (store, dir) = temp_store();
        let path = dir.path().join("settings.json");

        fs::write(&path, "not json").unwrap();
        assert_eq!(store.load_settings(), Settings::default());

        fs::write(&path, r#"{"hours": -1, "minutes": 5}"#).unwrap();
        assert_eq!(store.load_settings(), Settings::default());

        fs::write(&path, r#"{"hours": 0, "minutes": 0}"#).unwrap();
        assert_eq!(store.load_settings(), Settings::default());

        fs::write(&path, r#"{"hours": 2}"#).unwrap();
        assert_eq!(store.load_settings(), Settings { hours: 2, minutes: 25 });
    }

    #[test]
    fn test_save_settings_overwrites() {
        let (store, _dir) = temp_store();
        store.save_settings(&Settings::new(0, 50)).unwrap();
        store.save_settings(&Settings::new(2, 15)).unwrap();
        assert_eq!(store.load_settings(), Settings { hours: 2, minutes: 15 });
    }

    #[test]
    fn test_clear_removes_everything() {
        let (store, _dir) = temp_store();
        store.append(&session(0, 1500, true)).unwrap();
        store.save_settings(&Settings::new(1, 0)).unwrap();

        store.clear().unwrap();
        assert!(store.list_all().is_empty());
        assert_eq!(store.load_settings(), Settings::default());

        // Clearing an empty store is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_restore_replaces_contents() {
        let (store, _dir) = temp_store();
        store.append(&session(0, 1500, true)).unwrap();

        let replacement = vec![session(10, 300, false), session(20, 900, true)];
        store.restore(&replacement, &Settings::new(0, 15)).unwrap();

        assert_eq!(store.list_all(), replacement);
        assert_eq!(store.load_settings(), Settings { hours: 0, minutes: 15 });
    }

    #[test]
    fn test_append_fails_loudly_when_unwritable() {
        let (store, dir) = temp_store();
        // A directory where the file should be makes the rename fail
        fs::create_dir(dir.path().join("sessions.json")).unwrap();
        assert!(store.append(&session(0, 60, false)).is_err());
    }
}
