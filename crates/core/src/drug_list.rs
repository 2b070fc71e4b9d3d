//! The dynamic drug list of the edit form.
//!
//! Each entry carries an opaque [`DraftKey`] assigned when the entry is created. Keys never
//! derive from position, so removing an entry leaves every other entry's key intact and a
//! renderer never reuses a stale key for a different row. Indices are derived on demand for
//! rendering and for index-addressed removal.

use crate::discharge_summary::DrugInstruction;
use crate::form::PostedDrug;
use crate::schema::DrugSubField;
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

const MAX_KEY_LEN: usize = 64;

/// Stable identity of one drug entry while the form is being edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DraftKey(String);

impl DraftKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accept a key echoed back by the client if it is plausibly one of ours.
    pub fn parse(raw: &str) -> Option<Self> {
        let ok = !raw.is_empty()
            && raw.len() <= MAX_KEY_LEN
            && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
        ok.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Raw values of one drug entry, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrugDraft {
    pub name: String,
    pub strength: String,
    pub frequency: String,
    pub duration: String,
    pub time: String,
}

impl DrugDraft {
    pub fn get(&self, sub: DrugSubField) -> &str {
        match sub {
            DrugSubField::Name => &self.name,
            DrugSubField::Strength => &self.strength,
            DrugSubField::Frequency => &self.frequency,
            DrugSubField::Duration => &self.duration,
            DrugSubField::Time => &self.time,
        }
    }

    pub fn set(&mut self, sub: DrugSubField, value: String) {
        let slot = match sub {
            DrugSubField::Name => &mut self.name,
            DrugSubField::Strength => &mut self.strength,
            DrugSubField::Frequency => &mut self.frequency,
            DrugSubField::Duration => &mut self.duration,
            DrugSubField::Time => &mut self.time,
        };
        *slot = value;
    }
}

impl From<&DrugInstruction> for DrugDraft {
    fn from(drug: &DrugInstruction) -> Self {
        Self {
            name: drug.name.to_string(),
            strength: drug.strength.to_string(),
            frequency: drug.frequency.to_string(),
            duration: drug.duration.to_string(),
            time: drug.time.to_string(),
        }
    }
}

/// One keyed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugEntry {
    pub key: DraftKey,
    pub draft: DrugDraft,
}

/// Ordered, keyed drug entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrugListEditor {
    entries: Vec<DrugEntry>,
}

impl DrugListEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries for a stored prescription list, each with a fresh key.
    pub fn from_instructions(drugs: &[DrugInstruction]) -> Self {
        Self {
            entries: drugs
                .iter()
                .map(|drug| DrugEntry {
                    key: DraftKey::generate(),
                    draft: DrugDraft::from(drug),
                })
                .collect(),
        }
    }

    /// Entries for posted rows, keeping posted keys.
    ///
    /// A row whose key is missing, malformed or already taken by an earlier row gets a fresh
    /// key.
    pub fn from_posted(rows: &[PostedDrug]) -> Self {
        let mut seen = HashSet::new();
        let entries = rows
            .iter()
            .map(|row| {
                let key = row
                    .key
                    .as_deref()
                    .and_then(DraftKey::parse)
                    .filter(|key| !seen.contains(key))
                    .unwrap_or_else(DraftKey::generate);
                seen.insert(key.clone());
                DrugEntry {
                    key,
                    draft: row.draft.clone(),
                }
            })
            .collect();
        Self { entries }
    }

    /// Append a blank entry at the end and return its key.
    pub fn append(&mut self) -> DraftKey {
        let key = DraftKey::generate();
        self.entries.push(DrugEntry {
            key: key.clone(),
            draft: DrugDraft::default(),
        });
        key
    }

    /// Remove the entry at `index`; later entries shift down by one.
    ///
    /// Returns `None` and leaves the list untouched when `index` is out of range.
    pub fn remove_at(&mut self, index: usize) -> Option<DrugEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn entries(&self) -> &[DrugEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
