// ehr_services/src/ehr.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use content_store::ContentStore;
use ledger::{submit_with_retry, EntityStore, LedgerStore, RetryPolicy};
use log::{info, warn};
use models::hashing;
use models::{ClinicalDetails, EhrError, EhrRecord, EhrResult, EhrWithDetails};

use crate::identity::{Credential, IdentityResolver};
use crate::permission::PermissionService;
use crate::registry::{DoctorRegistry, PatientRegistry};

pub const EHR_NAMESPACE: &str = "ehr";
pub const EHR_PATIENT_INDEX: &str = "ehr_by_patient";

/// A patient's records with per-record fetch accounting: one missing blob
/// flags that record instead of failing the list.
#[derive(Debug, Clone)]
pub struct PatientEhrs {
    pub ehrs: Vec<EhrWithDetails>,
    pub failed_fetches: usize,
}

/// Orchestrates record creation and retrieval: identity resolution,
/// existence checks, the permission gate, the content round-trip, and the
/// ledger linkage. Content is written before the ledger record, so a crash
/// in between leaves at worst an orphaned blob, never a dangling pointer.
#[derive(Debug, Clone)]
pub struct EhrService {
    ledger: Arc<dyn LedgerStore>,
    records: EntityStore<EhrRecord>,
    content: Arc<dyn ContentStore>,
    resolver: IdentityResolver,
    patients: PatientRegistry,
    doctors: DoctorRegistry,
    permissions: PermissionService,
    retry: RetryPolicy,
    submit_deadline: Duration,
}

impl EhrService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        content: Arc<dyn ContentStore>,
        resolver: IdentityResolver,
        patients: PatientRegistry,
        doctors: DoctorRegistry,
        permissions: PermissionService,
        retry: RetryPolicy,
        submit_deadline: Duration,
    ) -> Self {
        EhrService {
            records: EntityStore::new(ledger.clone(), EHR_NAMESPACE),
            ledger,
            content,
            resolver,
            patients,
            doctors,
            permissions,
            retry,
            submit_deadline,
        }
    }

    /// Create a record for the patient behind `credential`, authored by
    /// `doctor_id`. Requires the patient and doctor to exist and an active
    /// grant from the patient to the doctor.
    pub async fn create_ehr(
        &self,
        credential: &Credential,
        doctor_id: &str,
        hospital_id: &str,
        details: ClinicalDetails,
    ) -> EhrResult<EhrWithDetails> {
        let resolved = self.resolver.resolve(credential).await?;
        let patient_id = resolved.patient_id;

        let patient = self
            .patients
            .get(&patient_id)
            .await?
            .ok_or_else(|| EhrError::PatientNotFound(patient_id.clone()))?;

        if !self.doctors.exists(doctor_id).await? {
            return Err(EhrError::DoctorNotFound(doctor_id.to_string()));
        }

        if !self.permissions.check(&patient_id, doctor_id).await? {
            return Err(EhrError::PermissionDenied {
                patient_id,
                doctor_id: doctor_id.to_string(),
            });
        }

        // Content first; a ledger record must never point at a blob that was
        // not written.
        let payload = serde_json::to_vec(&details)?;
        let cid = self.content.put(payload).await?;

        let ehr_id = hashing::ehr_id(&cid, Utc::now().timestamp_millis());
        let record = EhrRecord {
            ehr_id: ehr_id.clone(),
            patient_id: patient_id.clone(),
            doctor_id: doctor_id.to_string(),
            hospital_id: hospital_id.to_string(),
            cid,
            blood_group: patient.blood_group.clone(),
        };

        self.submit_record(&record).await?;
        self.submit_index_entry(&record).await?;
        info!("created EHR {ehr_id} for patient {patient_id} by {doctor_id}");

        Ok(EhrWithDetails {
            record,
            details: Some(details),
            fetch_error: None,
        })
    }

    async fn submit_record(&self, record: &EhrRecord) -> EhrResult<()> {
        let deadline = self.submit_deadline;
        submit_with_retry(&self.retry, || {
            let records = self.records.clone();
            let record = record.clone();
            async move {
                match tokio::time::timeout(deadline, records.put_new(&record.ehr_id, &record)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(EhrError::DeadlineExceeded(format!(
                        "submit of EHR {}",
                        record.ehr_id
                    ))),
                }
            }
        })
        .await
    }

    async fn submit_index_entry(&self, record: &EhrRecord) -> EhrResult<()> {
        let key = format!(
            "{}/{}/{}",
            EHR_PATIENT_INDEX, record.patient_id, record.ehr_id
        );
        submit_with_retry(&self.retry, || {
            let ledger = self.ledger.clone();
            let key = key.clone();
            let ehr_id = record.ehr_id.clone();
            async move { ledger.put(&key, ehr_id.into_bytes()).await }
        })
        .await
    }

    /// All records for the patient behind `credential`, each joined with its
    /// payload. An empty list is a valid answer; a failed payload fetch marks
    /// that record and moves on.
    pub async fn get_patient_ehrs(&self, credential: &Credential) -> EhrResult<PatientEhrs> {
        let resolved = self.resolver.resolve(credential).await?;
        let patient_id = resolved.patient_id;

        if !self.patients.exists(&patient_id).await? {
            return Err(EhrError::PatientNotFound(patient_id));
        }

        let index_prefix = format!("{EHR_PATIENT_INDEX}/{patient_id}/");
        let mut ehrs = Vec::new();
        let mut failed_fetches = 0usize;

        for (index_key, value) in self.ledger.scan_prefix(&index_prefix).await? {
            let ehr_id = String::from_utf8_lossy(&value).to_string();
            let record = match self.records.get(&ehr_id).await? {
                Some(record) => record,
                None => {
                    warn!("index entry {index_key} points at missing EHR {ehr_id}");
                    continue;
                }
            };
            ehrs.push(self.join_details(record, &mut failed_fetches).await);
        }

        Ok(PatientEhrs {
            ehrs,
            failed_fetches,
        })
    }

    async fn join_details(
        &self,
        record: EhrRecord,
        failed_fetches: &mut usize,
    ) -> EhrWithDetails {
        match self.fetch_details(&record.cid).await {
            Ok(details) => EhrWithDetails {
                record,
                details: Some(details),
                fetch_error: None,
            },
            Err(err) => {
                warn!("payload fetch failed for EHR {}: {err}", record.ehr_id);
                *failed_fetches += 1;
                EhrWithDetails {
                    record,
                    details: None,
                    fetch_error: Some(err.to_string()),
                }
            }
        }
    }

    async fn fetch_details(&self, cid: &str) -> EhrResult<ClinicalDetails> {
        let bytes = self.content.get(cid).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Typed view of the whole EHR keyspace, for the research path.
    pub fn records(&self) -> EntityStore<EhrRecord> {
        self.records.clone()
    }
}
