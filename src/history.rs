use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dataset::DEMO_DATASET;
use crate::models::{AnalysisRecord, AnalysisResponse};
use crate::risk;

pub const MAX_ITEMS: usize = 50;
pub const HISTORY_FILE: &str = "ai_fraud_recent_analyses.json";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Backend {
    File(PathBuf),
    Memory,
}

/// Most-recent-first list of past verdicts, capped at [`MAX_ITEMS`].
#[derive(Debug)]
pub struct HistoryStore {
    backend: Backend,
    records: Vec<AnalysisRecord>,
}

/// `<data_local_dir>/fraud-scan/ai_fraud_recent_analyses.json`
pub fn default_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("fraud-scan").join(HISTORY_FILE))
}

impl HistoryStore {
    /// Opens the history file. A missing file is an empty history; an
    /// unreadable one leaves the store in memory for this process.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(content) => {
                let records = match serde_json::from_str::<Vec<AnalysisRecord>>(&content) {
                    Ok(mut records) => {
                        records.truncate(MAX_ITEMS);
                        records
                    }
                    Err(err) => {
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "history file is corrupt; starting empty"
                        );
                        Vec::new()
                    }
                };
                debug!(path = %path.display(), count = records.len(), "loaded history");
                Self {
                    backend: Backend::File(path),
                    records,
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Self {
                backend: Backend::File(path),
                records: Vec::new(),
            },
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "cannot read history; keeping it in memory"
                );
                Self::in_memory()
            }
        }
    }

    /// Opens the configured path, the platform default, or memory.
    pub fn open_default(configured: Option<&Path>) -> Self {
        match configured.map(Path::to_path_buf).or_else(default_path) {
            Some(path) => Self::open(path),
            None => {
                warn!("no local data directory; history is kept in memory");
                Self::in_memory()
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory,
            records: Vec::new(),
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, Backend::File(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::File(path) => Some(path),
            Backend::Memory => None,
        }
    }

    pub fn list(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn add(&mut self, response: &AnalysisResponse, mode: &str) -> AnalysisRecord {
        let record = record_for(response, mode);
        self.records.insert(0, record.clone());
        self.records.truncate(MAX_ITEMS);
        self.persist();
        record
    }

    pub fn clear(&mut self) {
        self.records.clear();
        match &self.backend {
            Backend::File(path) => match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cannot remove history file");
                    self.backend = Backend::Memory;
                }
            },
            Backend::Memory => {}
        }
    }

    /// Fills the history with offline verdicts for every demo scenario.
    pub fn seed(&mut self) -> usize {
        for item in DEMO_DATASET.iter().rev() {
            let mut response = risk::score_text(item.text);
            response.input_id = Some(item.id.to_string());
            self.records.insert(0, record_for(&response, "demo"));
        }
        self.records.truncate(MAX_ITEMS);
        self.persist();
        DEMO_DATASET.len()
    }

    fn persist(&mut self) {
        let Backend::File(path) = &self.backend else {
            return;
        };
        if let Err(err) = write_records(path, &self.records) {
            warn!(
                path = %path.display(),
                error = %err,
                "cannot save history; keeping it in memory"
            );
            self.backend = Backend::Memory;
        }
    }
}

fn record_for(response: &AnalysisResponse, mode: &str) -> AnalysisRecord {
    AnalysisRecord {
        id: response
            .input_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        timestamp: Utc::now(),
        mode: Some(mode.to_string()),
        risk_score: Some(response.risk_score),
        confidence: Some(response.confidence),
        raw: serde_json::to_value(response).unwrap_or_default(),
    }
}

fn write_records(path: &Path, records: &[AnalysisRecord]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(records)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    fn verdict(score: u8) -> AnalysisResponse {
        let mut response = risk::score_text("Lunch at 1pm tomorrow?");
        response.risk_score = score;
        response
    }

    #[test]
    fn missing_file_is_an_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path().join("nested").join(HISTORY_FILE));
        assert!(store.list().is_empty());
        assert!(store.is_persistent());
    }

    #[test]
    fn newest_first_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);

        let mut store = HistoryStore::open(&path);
        store.add(&verdict(10), "text");
        store.add(&verdict(90), "email");

        let reopened = HistoryStore::open(&path);
        let scores: Vec<Option<u8>> = reopened.list().iter().map(|r| r.risk_score).collect();
        assert_eq!(scores, vec![Some(90), Some(10)]);
        assert_eq!(reopened.list()[0].mode.as_deref(), Some("email"));
    }

    #[test]
    fn history_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::open(dir.path().join(HISTORY_FILE));
        for score in 0..(MAX_ITEMS as u8 + 5) {
            store.add(&verdict(score), "text");
        }

        assert_eq!(store.list().len(), MAX_ITEMS);
        assert_eq!(store.list()[0].risk_score, Some(MAX_ITEMS as u8 + 4));
    }

    #[test]
    fn input_id_becomes_the_record_id() {
        let mut store = HistoryStore::in_memory();
        let mut response = verdict(5);
        response.input_id = Some("abc".to_string());
        assert_eq!(store.add(&response, "text").id, "abc");
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        let mut store = HistoryStore::open(&path);
        store.add(&verdict(50), "text");
        assert!(path.exists());

        store.clear();
        assert!(store.list().is_empty());
        assert!(!path.exists());
        assert!(HistoryStore::open(&path).list().is_empty());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        fs::write(&path, "{not json").unwrap();

        let store = HistoryStore::open(&path);
        assert!(store.list().is_empty());
        assert!(store.is_persistent());
    }

    #[test]
    fn write_failure_degrades_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let mut store = HistoryStore::open(blocker.join(HISTORY_FILE));
        store.add(&verdict(70), "text");

        assert!(!store.is_persistent());
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn seed_records_every_scenario() {
        let mut store = HistoryStore::in_memory();
        let seeded = store.seed();

        assert_eq!(seeded, DEMO_DATASET.len());
        assert_eq!(store.list().len(), DEMO_DATASET.len());
        assert_eq!(store.list()[0].id, DEMO_DATASET[0].id);
        let kyc = store.list().iter().find(|r| r.id == "bank-kyc").unwrap();
        assert_eq!(kyc.risk_level(), Some(RiskLevel::Critical));
    }
}
