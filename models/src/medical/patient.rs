// models/src/medical/patient.rs

use serde::{Deserialize, Serialize};

use crate::hashing::nid_hash;

/// Demographic record for a registered patient, keyed on the ledger by the
/// hash of the national-ID number. The biometric matcher returns the same
/// shape for a matched citizen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub nid_no: String,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub father_name: Option<String>,
}

impl PatientRecord {
    pub fn new(nid_no: impl Into<String>) -> Self {
        PatientRecord {
            nid_no: nid_no.into(),
            name: None,
            gender: None,
            date_of_birth: None,
            address: None,
            blood_group: None,
            email: None,
            phone: None,
            father_name: None,
        }
    }

    /// Ledger key for this record, a pure function of the NID.
    pub fn patient_id(&self) -> String {
        nid_hash(&self.nid_no)
    }
}

#[cfg(test)]
mod tests {
    use super::PatientRecord;

    #[test]
    fn patient_id_matches_nid_hash() {
        let patient = PatientRecord::new("5000000001");
        assert_eq!(patient.patient_id(), crate::hashing::nid_hash("5000000001"));
    }
}
