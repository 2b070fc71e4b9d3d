//! Discharge summary storage.
//!
//! Request handling talks to storage only through [`DischargeSummaryStore`]. Every call is
//! scoped by hospital id; a record from one hospital is never visible through another
//! hospital's id.
//!
//! Implementations:
//! - [`YamlFileStore`]: one YAML document per record under the data directory.
//! - [`InMemoryStore`]: process-local map, used by tests and ephemeral runs.

pub mod file;
pub mod memory;
pub mod wire;

pub use file::YamlFileStore;
pub use memory::InMemoryStore;

use crate::discharge_summary::{DischargeSummary, DischargeSummaryUpdate};
use crate::HmsResult;

/// Persistence seam for discharge summaries.
///
/// Writes are last-write-wins. No implementation detects that a record changed between a read
/// and a later update.
pub trait DischargeSummaryStore: Send + Sync {
    /// Fetch one record scoped to a hospital.
    fn find(&self, id: &str, hospital_id: &str) -> HmsResult<Option<DischargeSummary>>;

    /// Apply a validated update to the record it addresses.
    ///
    /// Returns `Ok(None)` when no record matches `(hospital_id, discharge_summary_id)`.
    fn update(&self, update: &DischargeSummaryUpdate) -> HmsResult<Option<DischargeSummary>>;

    /// Add a new record. Fails with [`crate::HmsError::AlreadyExists`] if the id is taken.
    fn insert(&self, record: DischargeSummary) -> HmsResult<()>;

    /// Every record of one hospital, ordered by id.
    fn list(&self, hospital_id: &str) -> HmsResult<Vec<DischargeSummary>>;
}
