// models/src/medical/ehr.rs

use serde::{Deserialize, Serialize};

/// On-ledger EHR record. Holds linkage metadata and a pointer into the
/// content-addressed store; the clinical payload itself never lands on the
/// ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EhrRecord {
    pub ehr_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub hospital_id: String,
    pub cid: String,
    /// Blood group snapshot taken from the patient record at authoring time,
    /// preferred over the payload field on the research path.
    pub blood_group: Option<String>,
}

/// Medication lists arrive either flat or nested one level (the legacy feed
/// produced both). Both shapes deserialize; consumers see a flat list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Medications {
    Flat(Vec<String>),
    Nested(Vec<Vec<String>>),
}

impl Default for Medications {
    fn default() -> Self {
        Medications::Flat(Vec::new())
    }
}

impl Medications {
    /// Flattened, trimmed, with empty entries dropped.
    pub fn flattened(&self) -> Vec<String> {
        let iter: Vec<&String> = match self {
            Medications::Flat(meds) => meds.iter().collect(),
            Medications::Nested(groups) => groups.iter().flatten().collect(),
        };
        iter.into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect()
    }

    /// Comma-joined form used by the research views; `None` when empty.
    pub fn joined(&self) -> Option<String> {
        let meds = self.flattened();
        if meds.is_empty() {
            None
        } else {
            Some(meds.join(", "))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResults {
    pub blood_pressure: Option<String>,
    pub cholesterol: Option<String>,
    pub allergy: Option<String>,
}

/// Full clinical payload stored off-ledger. Demographics are denormalized in
/// at authoring time so a single-record read needs no second ledger lookup;
/// they may go stale if the patient record later changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalDetails {
    pub visit_date: Option<String>,
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub medications: Medications,
    #[serde(default)]
    pub test_results: TestResults,
    pub notes: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
}

/// An EHR record joined with its payload for display. When the content fetch
/// for one record fails, the record is still returned with the error noted
/// instead of failing the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EhrWithDetails {
    #[serde(flatten)]
    pub record: EhrRecord,
    pub details: Option<ClinicalDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{ClinicalDetails, Medications};

    #[test]
    fn medications_accept_flat_and_nested_shapes() {
        let flat: Medications = serde_json::from_str(r#"["Aspirin", "Statin"]"#).unwrap();
        let nested: Medications = serde_json::from_str(r#"[["Aspirin"], ["Statin", ""]]"#).unwrap();
        assert_eq!(flat.flattened(), vec!["Aspirin", "Statin"]);
        assert_eq!(nested.flattened(), vec!["Aspirin", "Statin"]);
        assert_eq!(nested.joined().as_deref(), Some("Aspirin, Statin"));
    }

    #[test]
    fn empty_medications_join_to_none() {
        assert_eq!(Medications::default().joined(), None);
        let blanks: Medications = serde_json::from_str(r#"["  ", ""]"#).unwrap();
        assert_eq!(blanks.joined(), None);
    }

    #[test]
    fn clinical_details_round_trip_is_single_encoded() {
        let details = ClinicalDetails {
            diagnosis: Some("Hypertension".into()),
            ..ClinicalDetails::default()
        };
        let bytes = serde_json::to_vec(&details).unwrap();
        let back: ClinicalDetails = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, details);
    }
}
