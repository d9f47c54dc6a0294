// ehr_services/src/research.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use content_store::ContentStore;
use futures::stream::{self, StreamExt};
use ledger::EntityStore;
use log::warn;
use models::{
    ClinicalDetails, EhrRecord, EhrResult, FilterMetadata, FilterSpec, FlatRecord, ResearchStats,
};

pub const AGE_GROUPS: [&str; 5] = ["0-20", "21-35", "36-50", "51-65", "65+"];
pub const GENDERS: [&str; 3] = ["Male", "Female", "Other"];
pub const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "O+", "O-", "AB+", "AB-"];

/// Preview result plus scan accounting; skipped counts records whose
/// payload could not be fetched or parsed.
#[derive(Debug, Clone)]
pub struct Preview {
    pub records: Vec<FlatRecord>,
    pub scanned: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct CsvExport {
    pub csv: Vec<u8>,
    pub rows: usize,
    pub fallback_rows: usize,
}

/// De-identified aggregate read path over the whole EHR corpus. It scans
/// every record regardless of per-patient grants; output is the flattened
/// projection only, never raw identities.
#[derive(Debug, Clone)]
pub struct ResearchService {
    records: EntityStore<EhrRecord>,
    content: Arc<dyn ContentStore>,
    fetch_concurrency: usize,
}

impl ResearchService {
    pub fn new(
        records: EntityStore<EhrRecord>,
        content: Arc<dyn ContentStore>,
        fetch_concurrency: usize,
    ) -> Self {
        ResearchService {
            records,
            content,
            fetch_concurrency: fetch_concurrency.max(1),
        }
    }

    /// First `limit` matching rows in scan order. The scan stops as soon as
    /// the limit is reached, so the sample is fast but not representative.
    pub async fn preview(&self, filters: &FilterSpec, limit: usize) -> EhrResult<Preview> {
        let today = Utc::now().date_naive();
        let mut preview = Preview {
            records: Vec::new(),
            scanned: 0,
            skipped: 0,
        };

        for record in self.records.list().await? {
            if preview.records.len() >= limit {
                break;
            }
            preview.scanned += 1;
            match self.fetch_details(&record).await {
                Ok(details) => {
                    let flat = flatten(&record, &details, today);
                    if matches_filters(&flat, filters) {
                        preview.records.push(flat);
                    }
                }
                Err(err) => {
                    warn!("research preview skipping EHR {}: {err}", record.ehr_id);
                    preview.skipped += 1;
                }
            }
        }
        Ok(preview)
    }

    /// CSV export with the fixed 11-column layout. Without filters, a
    /// record whose payload is unavailable still contributes a sentinel
    /// fallback row; with filters, unreadable records are skipped since
    /// they cannot be matched.
    pub async fn export_csv(&self, filters: Option<&FilterSpec>) -> EhrResult<CsvExport> {
        let today = Utc::now().date_naive();
        let records = self.records.list().await?;

        let fetched: Vec<(EhrRecord, EhrResult<ClinicalDetails>)> = stream::iter(records)
            .map(|record| {
                let service = self.clone();
                async move {
                    let details = service.fetch_details(&record).await;
                    (record, details)
                }
            })
            .buffer_unordered(self.fetch_concurrency)
            .collect()
            .await;

        let mut rows = Vec::new();
        let mut fallback_rows = 0usize;
        for (record, details) in fetched {
            match details {
                Ok(details) => {
                    let flat = flatten(&record, &details, today);
                    match filters {
                        Some(spec) if !matches_filters(&flat, spec) => {}
                        _ => rows.push(flat),
                    }
                }
                Err(err) => {
                    warn!("research export fallback for EHR {}: {err}", record.ehr_id);
                    if filters.is_none() {
                        rows.push(FlatRecord::fallback());
                        fallback_rows += 1;
                    }
                }
            }
        }

        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        let row_count = rows.len();
        for row in &rows {
            writer
                .serialize(row)
                .map_err(|err| models::EhrError::Serialization(err.to_string()))?;
        }
        let csv = writer
            .into_inner()
            .map_err(|err| models::EhrError::Serialization(err.to_string()))?;

        Ok(CsvExport {
            csv,
            rows: row_count,
            fallback_rows,
        })
    }

    /// Filter dimensions for the research UI. Age groups, genders and blood
    /// groups are fixed; diagnoses are collected from the observed data.
    pub async fn filter_metadata(&self) -> EhrResult<FilterMetadata> {
        let mut diagnoses = BTreeSet::new();
        for record in self.records.list().await? {
            match self.fetch_details(&record).await {
                Ok(details) => {
                    if let Some(diagnosis) = details.diagnosis {
                        for part in diagnosis.split(',') {
                            let part = part.trim();
                            if !part.is_empty() {
                                diagnoses.insert(part.to_string());
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!("filter metadata skipping EHR {}: {err}", record.ehr_id);
                }
            }
        }
        Ok(FilterMetadata {
            age_groups: AGE_GROUPS.iter().map(|s| s.to_string()).collect(),
            genders: GENDERS.iter().map(|s| s.to_string()).collect(),
            blood_groups: BLOOD_GROUPS.iter().map(|s| s.to_string()).collect(),
            diagnoses: diagnoses.into_iter().collect(),
        })
    }

    /// Corpus-level counts: totals plus per-diagnosis, per-medication and
    /// per-allergy tallies.
    pub async fn stats(&self) -> EhrResult<ResearchStats> {
        let records = self.records.list().await?;
        let mut stats = ResearchStats {
            total_ehrs: records.len(),
            ..ResearchStats::default()
        };

        let mut patients = BTreeSet::new();
        let mut doctors = BTreeSet::new();
        let mut hospitals = BTreeSet::new();
        for record in &records {
            patients.insert(record.patient_id.clone());
            doctors.insert(record.doctor_id.clone());
            hospitals.insert(record.hospital_id.clone());
        }
        stats.total_patients = patients.len();
        stats.total_doctors = doctors.len();
        stats.total_hospitals = hospitals.len();

        for record in &records {
            let details = match self.fetch_details(record).await {
                Ok(details) => details,
                Err(err) => {
                    warn!("stats skipping EHR {}: {err}", record.ehr_id);
                    continue;
                }
            };
            if let Some(diagnosis) = &details.diagnosis {
                *stats.diagnosis_count.entry(diagnosis.clone()).or_default() += 1;
            }
            for medication in details.medications.flattened() {
                *stats.medication_count.entry(medication).or_default() += 1;
            }
            if let Some(allergy) = &details.test_results.allergy {
                *stats.allergy_count.entry(allergy.clone()).or_default() += 1;
            }
        }
        Ok(stats)
    }

    async fn fetch_details(&self, record: &EhrRecord) -> EhrResult<ClinicalDetails> {
        let bytes = self.content.get(&record.cid).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Flatten one record + payload into the de-identified research row.
pub fn flatten(record: &EhrRecord, details: &ClinicalDetails, today: NaiveDate) -> FlatRecord {
    let birth_date = details.date_of_birth.as_deref().and_then(parse_birth_date);
    let age = birth_date.and_then(|born| age_on(born, today));

    FlatRecord {
        age_group: age.map(age_group).unwrap_or_else(|| "Unknown".into()),
        age: age
            .map(|a| a.to_string())
            .unwrap_or_else(|| "Unknown".into()),
        gender: normalize_gender(details.gender.as_deref()),
        diagnosis: details
            .diagnosis
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "Unknown".into()),
        medication: details
            .medications
            .joined()
            .unwrap_or_else(|| "None".into()),
        visit_date: details
            .visit_date
            .clone()
            .unwrap_or_else(|| "Unknown".into()),
        blood_pressure: details
            .test_results
            .blood_pressure
            .clone()
            .unwrap_or_else(|| "N/A".into()),
        cholesterol: details
            .test_results
            .cholesterol
            .clone()
            .unwrap_or_else(|| "N/A".into()),
        allergy: details
            .test_results
            .allergy
            .clone()
            .unwrap_or_else(|| "None".into()),
        // Record-level snapshot wins over the payload field.
        blood_group: record
            .blood_group
            .clone()
            .or_else(|| details.blood_group.clone())
            .unwrap_or_else(|| "Unknown".into()),
        notes: details
            .notes
            .clone()
            .unwrap_or_else(|| "No comments".into()),
    }
}

/// Allow-list semantics: empty list means the dimension is unfiltered.
/// Diagnosis matches when any of the row's comma-split diagnoses is listed.
pub fn matches_filters(row: &FlatRecord, filters: &FilterSpec) -> bool {
    if !filters.age_groups.is_empty() && !filters.age_groups.contains(&row.age_group) {
        return false;
    }
    if !filters.genders.is_empty() && !filters.genders.contains(&row.gender) {
        return false;
    }
    if !filters.blood_groups.is_empty() && !filters.blood_groups.contains(&row.blood_group) {
        return false;
    }
    if !filters.diagnoses.is_empty() {
        let any_match = row
            .diagnosis
            .split(',')
            .map(str::trim)
            .any(|part| filters.diagnoses.iter().any(|d| d == part));
        if !any_match {
            return false;
        }
    }
    true
}

/// Birth dates arrive either ISO (`YYYY-MM-DD`) or day-first (`DD/MM/YYYY`).
fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

/// Completed years as of `today`; `None` for a birth date in the future.
fn age_on(born: NaiveDate, today: NaiveDate) -> Option<i32> {
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    (age >= 0).then_some(age)
}

fn age_group(age: i32) -> String {
    match age {
        0..=20 => "0-20",
        21..=35 => "21-35",
        36..=50 => "36-50",
        51..=65 => "51-65",
        _ => "65+",
    }
    .to_string()
}

/// Case-insensitive synonym mapping; unrecognized values pass through
/// trimmed.
fn normalize_gender(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "Unknown".into();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "Unknown".into();
    }
    match trimmed.to_lowercase().as_str() {
        "m" | "male" | "man" => "Male".into(),
        "f" | "female" | "woman" => "Female".into(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use models::{ClinicalDetails, EhrRecord, FilterSpec, Medications};

    use super::{age_on, flatten, matches_filters, normalize_gender, parse_birth_date};

    fn record() -> EhrRecord {
        EhrRecord {
            ehr_id: "e1".into(),
            patient_id: "p1".into(),
            doctor_id: "d0001".into(),
            hospital_id: "h1".into(),
            cid: "c1".into(),
            blood_group: Some("O+".into()),
        }
    }

    fn details() -> ClinicalDetails {
        ClinicalDetails {
            visit_date: Some("2026-01-15".into()),
            diagnosis: Some("Hypertension, Diabetes".into()),
            medications: Medications::Nested(vec![vec!["Amlodipine".into()], vec![]]),
            date_of_birth: Some("1990-06-01".into()),
            gender: Some("f".into()),
            blood_group: Some("A+".into()),
            ..ClinicalDetails::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
    }

    #[test]
    fn birth_dates_parse_in_both_formats() {
        let iso = parse_birth_date("1990-06-01").unwrap();
        let day_first = parse_birth_date("01/06/1990").unwrap();
        assert_eq!(iso, day_first);
        assert!(parse_birth_date("June 1990").is_none());
    }

    #[test]
    fn age_accounts_for_birthday_not_yet_reached() {
        let today = today();
        let before = NaiveDate::from_ymd_opt(1990, 6, 1).unwrap();
        let after = NaiveDate::from_ymd_opt(1990, 12, 1).unwrap();
        assert_eq!(age_on(before, today), Some(36));
        assert_eq!(age_on(after, today), Some(35));
        let future = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert_eq!(age_on(future, today), None);
    }

    #[test]
    fn gender_synonyms_normalize_case_insensitively() {
        assert_eq!(normalize_gender(Some("M")), "Male");
        assert_eq!(normalize_gender(Some("woman")), "Female");
        assert_eq!(normalize_gender(Some(" Nonbinary ")), "Nonbinary");
        assert_eq!(normalize_gender(None), "Unknown");
    }

    #[test]
    fn flatten_prefers_record_level_blood_group() {
        let flat = flatten(&record(), &details(), today());
        assert_eq!(flat.blood_group, "O+");
        assert_eq!(flat.gender, "Female");
        assert_eq!(flat.age, "36");
        assert_eq!(flat.age_group, "36-50");
        assert_eq!(flat.medication, "Amlodipine");
    }

    #[test]
    fn diagnosis_filter_matches_any_comma_split_part() {
        let flat = flatten(&record(), &details(), today());
        let spec = FilterSpec {
            diagnoses: vec!["Diabetes".into()],
            ..FilterSpec::default()
        };
        assert!(matches_filters(&flat, &spec));

        let spec = FilterSpec {
            diagnoses: vec!["Asthma".into()],
            ..FilterSpec::default()
        };
        assert!(!matches_filters(&flat, &spec));
    }

    #[test]
    fn empty_lists_leave_dimensions_unfiltered() {
        let flat = flatten(&record(), &details(), today());
        assert!(matches_filters(&flat, &FilterSpec::default()));
        let spec = FilterSpec {
            genders: vec!["Female".into()],
            ..FilterSpec::default()
        };
        assert!(matches_filters(&flat, &spec));
        let spec = FilterSpec {
            genders: vec!["Male".into()],
            ..FilterSpec::default()
        };
        assert!(!matches_filters(&flat, &spec));
    }
}
