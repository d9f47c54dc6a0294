// models/src/errors.rs

use serde::{Deserialize, Serialize};
pub use thiserror::Error;

/// Shared error taxonomy for the EHR control plane.
///
/// Validation errors are caller-fixable and never retried. Of the
/// infrastructure errors only `ReadConflict` is retriable; everything else
/// is surfaced immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum EhrError {
    #[error("patient {0} not found")]
    PatientNotFound(String),
    #[error("doctor {0} not found")]
    DoctorNotFound(String),
    #[error("entity already exists: {0}")]
    AlreadyExists(String),
    #[error("permission already requested for patient {patient_id} by doctor {doctor_id}")]
    DuplicateRequest {
        patient_id: String,
        doctor_id: String,
    },
    #[error("no permission entry for patient {patient_id} and doctor {doctor_id}")]
    PermissionNotFound {
        patient_id: String,
        doctor_id: String,
    },
    #[error("doctor {doctor_id} has no active grant from patient {patient_id}")]
    PermissionDenied {
        patient_id: String,
        doctor_id: String,
    },
    #[error("identity could not be resolved: {0}")]
    IdentityNotResolved(String),
    #[error("content {0} not found in store")]
    ContentNotFound(String),
    #[error("content store error: {0}")]
    ContentStore(String),
    #[error("ledger read conflict: {0}")]
    ReadConflict(String),
    #[error("ledger error: {0}")]
    Ledger(String),
    #[error("ledger deadline exceeded: {0}")]
    DeadlineExceeded(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EhrError {
    /// Only optimistic-concurrency rejections qualify for the submit retry
    /// policy; every other class propagates immediately.
    pub fn is_retriable(&self) -> bool {
        matches!(self, EhrError::ReadConflict(_))
    }
}

impl From<serde_json::Error> for EhrError {
    fn from(err: serde_json::Error) -> Self {
        EhrError::Serialization(err.to_string())
    }
}

pub type EhrResult<T> = Result<T, EhrError>;
