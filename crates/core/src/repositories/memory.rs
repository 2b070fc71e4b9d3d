//! In-memory discharge summary store.

use super::DischargeSummaryStore;
use crate::discharge_summary::{DischargeSummary, DischargeSummaryUpdate};
use crate::{HmsError, HmsResult};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::RwLock;

type Key = (String, String);

/// Records keyed by `(hospital_id, id)`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<Key, DischargeSummary>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = DischargeSummary>) -> Self {
        Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|r| ((r.hospital_id.to_string(), r.id.to_string()), r))
                    .collect(),
            ),
        }
    }
}

fn key(id: &str, hospital_id: &str) -> Key {
    (hospital_id.to_string(), id.to_string())
}

impl DischargeSummaryStore for InMemoryStore {
    fn find(&self, id: &str, hospital_id: &str) -> HmsResult<Option<DischargeSummary>> {
        let records = self.records.read().map_err(|_| HmsError::LockPoisoned)?;
        Ok(records.get(&key(id, hospital_id)).cloned())
    }

    fn update(&self, update: &DischargeSummaryUpdate) -> HmsResult<Option<DischargeSummary>> {
        let mut records = self.records.write().map_err(|_| HmsError::LockPoisoned)?;
        let Some(record) = records.get_mut(&key(
            update.discharge_summary_id.as_str(),
            update.hospital_id.as_str(),
        )) else {
            return Ok(None);
        };
        record.apply(update, Utc::now());
        Ok(Some(record.clone()))
    }

    fn insert(&self, record: DischargeSummary) -> HmsResult<()> {
        let mut records = self.records.write().map_err(|_| HmsError::LockPoisoned)?;
        let k = key(record.id.as_str(), record.hospital_id.as_str());
        if records.contains_key(&k) {
            return Err(HmsError::AlreadyExists(format!("{}/{}", k.0, k.1)));
        }
        records.insert(k, record);
        Ok(())
    }

    fn list(&self, hospital_id: &str) -> HmsResult<Vec<DischargeSummary>> {
        let records = self.records.read().map_err(|_| HmsError::LockPoisoned)?;
        Ok(records
            .iter()
            .filter(|((hospital, _), _)| hospital == hospital_id)
            .map(|(_, record)| record.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discharge_summary::Narrative;
    use crate::NonEmptyText;
    use hms_types::PaymentType;

    fn record(id: &str, hospital: &str) -> DischargeSummary {
        let now = Utc::now();
        DischargeSummary {
            id: NonEmptyText::new(id).unwrap(),
            hospital_id: NonEmptyText::new(hospital).unwrap(),
            final_diagnosis: NonEmptyText::new("Fever").unwrap(),
            narrative: Narrative::default(),
            admit_date: None,
            discharge_date: None,
            payment_type: PaymentType::Insurance,
            drugs: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn records_are_isolated_per_hospital() {
        let store = InMemoryStore::with_records([record("ds1", "h1"), record("ds1", "h2")]);
        assert_eq!(store.list("h1").unwrap().len(), 1);
        assert!(store.find("ds1", "h3").unwrap().is_none());
        assert!(matches!(
            store.insert(record("ds1", "h1")),
            Err(HmsError::AlreadyExists(_))
        ));
    }
}
