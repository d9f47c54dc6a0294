// models/src/medical/permission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access grant between a doctor and a patient, keyed by the
/// (patient, doctor) pair. At most one active entry exists per pair;
/// denial or revocation removes the entry outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub patient_id: String,
    pub doctor_id: String,
    pub permission_given: bool,
    pub request_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl PermissionGrant {
    pub fn pending(patient_id: impl Into<String>, doctor_id: impl Into<String>) -> Self {
        PermissionGrant {
            patient_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            permission_given: false,
            request_date: Utc::now(),
            updated_date: None,
        }
    }

    /// Composite ledger key for the pair. Patient first, so all grants for
    /// one patient share a key prefix.
    pub fn pair_key(patient_id: &str, doctor_id: &str) -> String {
        format!("{patient_id}:{doctor_id}")
    }

    pub fn key(&self) -> String {
        Self::pair_key(&self.patient_id, &self.doctor_id)
    }
}
