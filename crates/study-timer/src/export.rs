//! Data export and import
//!
//! An export is one pretty-printed JSON document holding every stored session,
//! the settings, and the export time. Importing it restores exactly that data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::session::{iso_millis, Session, Settings};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write export {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to read export {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid export document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stop the running timer before importing")]
    TimerActive,

    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}

/// Everything the store holds, as one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub sessions: Vec<Session>,
    pub settings: Settings,
    #[serde(with = "iso_millis")]
    pub export_date: DateTime<Utc>,
}

impl ExportDocument {
    pub fn new(sessions: Vec<Session>, settings: Settings, exported_at: DateTime<Utc>) -> Self {
        Self {
            sessions,
            settings,
            export_date: exported_at,
        }
    }

    /// `study-timer-data-YYYY-MM-DD.json`, dated in UTC
    pub fn file_name(&self) -> String {
        format!("study-timer-data-{}.json", self.export_date.format("%Y-%m-%d"))
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Write into `dir` under `file_name()`, returning the full path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(self.file_name());
        let content = self.to_json()?;
        fs::write(&path, content).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    pub fn read_from(path: &Path) -> Result<Self, ExportError> {
        let content = fs::read_to_string(path).map_err(|source| ExportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn document() -> ExportDocument {
        let at = |h| Utc.with_ymd_and_hms(2024, 6, 2, h, 15, 0).unwrap();
        ExportDocument::new(
            vec![Session::new(at(8), 1500, true), Session::new(at(9), 95, false)],
            Settings::new(0, 25),
            at(23),
        )
    }

    #[test]
    fn test_file_name() {
        assert_eq!(document().file_name(), "study-timer-data-2024-06-02.json");
    }

    #[test]
    fn test_document_shape() {
        let json = document().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["exportDate"], "2024-06-02T23:15:00.000Z");
        assert_eq!(value["settings"]["hours"], 0);
        assert_eq!(value["settings"]["minutes"], 25);
        assert_eq!(value["sessions"][0]["date"], "2024-06-02T08:15:00.000Z");
        assert_eq!(value["sessions"][0]["duration"], 1500);
        assert_eq!(value["sessions"][1]["completed"], false);
        assert!(json.contains("\n  \"sessions\""));
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let exported = document();

        let path = exported.write_to(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("study-timer-data-2024-06-02.json"));
        assert_eq!(ExportDocument::read_from(&path).unwrap(), exported);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            ExportDocument::from_json("{\"sessions\": 3}"),
            Err(ExportError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = ExportDocument::read_from(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(ExportError::Read { .. })));
    }
}
