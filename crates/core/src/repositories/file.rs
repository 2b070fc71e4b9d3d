//! File-backed discharge summary store.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/discharge_summaries/
//!   <hospital_id>/
//!     <discharge_summary_id>.yaml
//! ```
//!
//! Writes go to a temporary sibling file that is then renamed over the target, so a reader
//! never sees a half-written document.

use super::{wire, DischargeSummaryStore};
use crate::config::CoreConfig;
use crate::constants::RECORD_FILE_EXTENSION;
use crate::discharge_summary::{DischargeSummary, DischargeSummaryUpdate};
use crate::validation::validate_identifier_safe_for_path;
use crate::{HmsError, HmsResult};
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct YamlFileStore {
    root: PathBuf,
}

impl YamlFileStore {
    /// Store rooted at `root` (the `discharge_summaries` directory itself).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.discharge_summary_dir())
    }

    fn hospital_dir(&self, hospital_id: &str) -> HmsResult<PathBuf> {
        validate_identifier_safe_for_path("hospital id", hospital_id)?;
        Ok(self.root.join(hospital_id))
    }

    fn record_path(&self, id: &str, hospital_id: &str) -> HmsResult<PathBuf> {
        validate_identifier_safe_for_path("discharge summary id", id)?;
        Ok(self
            .hospital_dir(hospital_id)?
            .join(format!("{id}.{RECORD_FILE_EXTENSION}")))
    }

    fn read(path: &Path) -> HmsResult<Option<DischargeSummary>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(HmsError::FileRead(err)),
        };
        wire::parse(&text).map(Some)
    }

    fn write(&self, record: &DischargeSummary) -> HmsResult<()> {
        let dir = self.hospital_dir(record.hospital_id.as_str())?;
        fs::create_dir_all(&dir).map_err(HmsError::StorageDirCreation)?;

        let target = self.record_path(record.id.as_str(), record.hospital_id.as_str())?;
        let tmp = dir.join(format!(".{}.{RECORD_FILE_EXTENSION}.tmp", record.id));
        fs::write(&tmp, wire::render(record)?).map_err(HmsError::FileWrite)?;
        if let Err(err) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(HmsError::FileWrite(err));
        }
        Ok(())
    }
}

impl DischargeSummaryStore for YamlFileStore {
    fn find(&self, id: &str, hospital_id: &str) -> HmsResult<Option<DischargeSummary>> {
        // No stored record can sit at an identifier that is not a safe path component.
        let path = match self.record_path(id, hospital_id) {
            Ok(path) => path,
            Err(HmsError::InvalidInput(reason)) => {
                tracing::debug!(id, hospital_id, %reason, "identifier cannot name a record");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let record = Self::read(&path)?;
        // A document filed under the wrong hospital directory is not that hospital's record.
        Ok(record.filter(|r| r.id.as_str() == id && r.hospital_id.as_str() == hospital_id))
    }

    fn update(&self, update: &DischargeSummaryUpdate) -> HmsResult<Option<DischargeSummary>> {
        let id = update.discharge_summary_id.as_str();
        let hospital_id = update.hospital_id.as_str();
        let Some(mut record) = self.find(id, hospital_id)? else {
            tracing::debug!(id, hospital_id, "no discharge summary to update");
            return Ok(None);
        };
        record.apply(update, Utc::now());
        self.write(&record)?;
        tracing::info!(id, hospital_id, "discharge summary updated");
        Ok(Some(record))
    }

    fn insert(&self, record: DischargeSummary) -> HmsResult<()> {
        let path = self.record_path(record.id.as_str(), record.hospital_id.as_str())?;
        if path.exists() {
            return Err(HmsError::AlreadyExists(format!(
                "{}/{}",
                record.hospital_id, record.id
            )));
        }
        self.write(&record)
    }

    fn list(&self, hospital_id: &str) -> HmsResult<Vec<DischargeSummary>> {
        let dir = self.hospital_dir(hospital_id)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(HmsError::FileRead(err)),
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = entry.map_err(HmsError::FileRead)?.path();
            let is_record = path.extension().and_then(|e| e.to_str()) == Some(RECORD_FILE_EXTENSION)
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
            if !is_record {
                continue;
            }
            if let Some(record) = Self::read(&path)? {
                records.push(record);
            }
        }
        records.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discharge_summary::{DrugInstruction, Narrative};
    use crate::NonEmptyText;
    use chrono::NaiveDate;
    use hms_types::{FrequencyCode, MealTiming, PaymentType};
    use tempfile::TempDir;

    fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).unwrap()
    }

    fn record(id: &str, hospital: &str) -> DischargeSummary {
        let now = Utc::now();
        DischargeSummary {
            id: text(id),
            hospital_id: text(hospital),
            final_diagnosis: text("Fever"),
            narrative: Narrative::default(),
            admit_date: None,
            discharge_date: None,
            payment_type: PaymentType::Card,
            drugs: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn update_for(id: &str, hospital: &str) -> DischargeSummaryUpdate {
        DischargeSummaryUpdate {
            discharge_summary_id: text(id),
            hospital_id: text(hospital),
            final_diagnosis: text("Pneumonia"),
            narrative: Narrative::default(),
            admit_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            discharge_date: None,
            payment_type: PaymentType::Cash,
            summary_drug_instruction: Some(vec![DrugInstruction {
                name: text("Amoxicillin"),
                strength: text("500mg"),
                frequency: FrequencyCode::MorningNight,
                duration: text("5"),
                time: MealTiming::After,
            }]),
        }
    }

    #[test]
    fn insert_find_and_list_are_scoped_by_hospital() {
        let tmp = TempDir::new().unwrap();
        let store = YamlFileStore::new(tmp.path());
        store.insert(record("ds2", "h1")).unwrap();
        store.insert(record("ds1", "h1")).unwrap();
        store.insert(record("ds1", "h2")).unwrap();

        assert!(store.find("ds1", "h1").unwrap().is_some());
        assert!(store.find("ds2", "h2").unwrap().is_none());

        let ids: Vec<String> = store
            .list("h1")
            .unwrap()
            .into_iter()
            .map(|r| r.id.into_inner())
            .collect();
        assert_eq!(ids, ["ds1", "ds2"]);
        assert!(store.list("nobody").unwrap().is_empty());
    }

    #[test]
    fn insert_rejects_duplicates() {
        let tmp = TempDir::new().unwrap();
        let store = YamlFileStore::new(tmp.path());
        store.insert(record("ds1", "h1")).unwrap();
        let err = store.insert(record("ds1", "h1")).expect_err("duplicate");
        assert!(matches!(err, HmsError::AlreadyExists(_)));
    }

    #[test]
    fn update_persists_and_returns_the_record() {
        let tmp = TempDir::new().unwrap();
        let store = YamlFileStore::new(tmp.path());
        store.insert(record("ds1", "h1")).unwrap();

        let updated = store
            .update(&update_for("ds1", "h1"))
            .unwrap()
            .expect("record exists");
        assert_eq!(updated.final_diagnosis.as_str(), "Pneumonia");

        let reloaded = store.find("ds1", "h1").unwrap().unwrap();
        assert_eq!(reloaded, updated);
        assert_eq!(
            crate::discharge_summary::to_display_date(reloaded.admit_date),
            "2024-01-15"
        );
        assert!(!tmp.path().join("h1").join(".ds1.yaml.tmp").exists());
    }

    #[test]
    fn update_of_missing_record_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = YamlFileStore::new(tmp.path());
        store.insert(record("ds1", "h2")).unwrap();
        assert!(store.update(&update_for("ds1", "h1")).unwrap().is_none());
    }

    #[test]
    fn unsafe_identifiers_never_reach_the_filesystem() {
        let tmp = TempDir::new().unwrap();
        let store = YamlFileStore::new(tmp.path());
        store.insert(record("ds1", "h1")).unwrap();

        for (id, hospital) in [("../etc", "h1"), ("ds.1", "h1"), ("ds1", "h1/.."), ("ds 1", "h1")] {
            assert!(store.find(id, hospital).unwrap().is_none(), "{id}@{hospital}");
        }
        assert!(store.update(&update_for("ds.1", "h1")).unwrap().is_none());
        assert!(store.list("h1/../..").is_err());

        let err = store.insert(record("../ds1", "h1")).expect_err("traversal");
        assert!(matches!(err, HmsError::InvalidInput(_)));
    }
}
