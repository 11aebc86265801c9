// ⚠️ Error taxonomy for the planner library
//
// Reads and writes against the store are kept apart so callers can tell
// "nothing was written" (StorageRead) from "a write was attempted"
// (StorageWrite). Missing recipe references are not errors at all.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PlannerError {
    /// A select against the store failed; nothing has been written.
    #[error("failed to read {what}: {source}")]
    StorageRead {
        what: &'static str,
        #[source]
        source: BoxError,
    },

    /// An insert/update against the store failed.
    #[error("failed to write {what}: {source}")]
    StorageWrite {
        what: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl PlannerError {
    pub fn read<E>(what: &'static str) -> impl FnOnce(E) -> PlannerError
    where
        E: Into<BoxError>,
    {
        move |e| PlannerError::StorageRead { what, source: e.into() }
    }

    pub fn write<E>(what: &'static str) -> impl FnOnce(E) -> PlannerError
    where
        E: Into<BoxError>,
    {
        move |e| PlannerError::StorageWrite { what, source: e.into() }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        PlannerError::NotFound { entity, id: id.into() }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PlannerError::Invalid { field, reason: reason.into() }
    }

    /// True when the failure happened before anything was written.
    pub fn is_read_failure(&self) -> bool {
        matches!(self, PlannerError::StorageRead { .. })
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
