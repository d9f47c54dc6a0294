// models/src/medical/research.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// De-identified flat projection of one EHR record plus payload, used only
/// for research previews and CSV export, never persisted. Field renames fix
/// the export column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    #[serde(rename = "Age_Group")]
    pub age_group: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Diagnosis")]
    pub diagnosis: String,
    #[serde(rename = "Medication")]
    pub medication: String,
    #[serde(rename = "Visit_Date")]
    pub visit_date: String,
    #[serde(rename = "Blood_Pressure")]
    pub blood_pressure: String,
    #[serde(rename = "Cholesterol")]
    pub cholesterol: String,
    #[serde(rename = "Allergy")]
    pub allergy: String,
    #[serde(rename = "Blood_Group")]
    pub blood_group: String,
    pub notes: String,
}

impl FlatRecord {
    /// Best-effort row emitted when a record's payload cannot be fetched or
    /// parsed during an unfiltered export.
    pub fn fallback() -> Self {
        FlatRecord {
            age_group: "Unknown".into(),
            age: "Unknown".into(),
            gender: "Unknown".into(),
            diagnosis: "Unknown".into(),
            medication: "None".into(),
            visit_date: "Unknown".into(),
            blood_pressure: "N/A".into(),
            cholesterol: "N/A".into(),
            allergy: "None".into(),
            blood_group: "Unknown".into(),
            notes: "No comments".into(),
        }
    }
}

/// Inclusion allow-lists. An empty list leaves that dimension unfiltered;
/// a non-empty list keeps only rows whose derived value is listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub age_groups: Vec<String>,
    #[serde(default)]
    pub genders: Vec<String>,
    #[serde(default)]
    pub diagnoses: Vec<String>,
    #[serde(default)]
    pub blood_groups: Vec<String>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.age_groups.is_empty()
            && self.genders.is_empty()
            && self.diagnoses.is_empty()
            && self.blood_groups.is_empty()
    }
}

/// Filter dimensions offered to the research UI. Age groups, genders and
/// blood groups are fixed enumerations; diagnoses reflect observed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMetadata {
    pub age_groups: Vec<String>,
    pub genders: Vec<String>,
    pub blood_groups: Vec<String>,
    pub diagnoses: Vec<String>,
}

/// Aggregate counts over the whole EHR corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchStats {
    pub total_ehrs: usize,
    pub total_patients: usize,
    pub total_doctors: usize,
    pub total_hospitals: usize,
    pub diagnosis_count: BTreeMap<String, usize>,
    pub medication_count: BTreeMap<String, usize>,
    pub allergy_count: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::{FilterSpec, FlatRecord};

    #[test]
    fn flat_record_serializes_with_export_column_names() {
        let json = serde_json::to_value(FlatRecord::fallback()).unwrap();
        let obj = json.as_object().unwrap();
        for column in [
            "Age_Group",
            "Age",
            "Gender",
            "Diagnosis",
            "Medication",
            "Visit_Date",
            "Blood_Pressure",
            "Cholesterol",
            "Allergy",
            "Blood_Group",
            "notes",
        ] {
            assert!(obj.contains_key(column), "missing column {column}");
        }
        assert_eq!(obj.len(), 11);
    }

    #[test]
    fn absent_filter_fields_default_to_unfiltered() {
        let spec: FilterSpec = serde_json::from_str(r#"{"genders": ["Female"]}"#).unwrap();
        assert!(spec.age_groups.is_empty());
        assert_eq!(spec.genders, vec!["Female"]);
        assert!(!spec.is_empty());
        assert!(FilterSpec::default().is_empty());
    }
}
