// ehr_services/src/registry.rs

use std::sync::Arc;

use ledger::{submit_with_retry, EntityStore, LedgerStore, RetryPolicy};
use log::info;
use models::{Doctor, EhrError, EhrResult, PatientRecord};

use crate::identity::{Credential, IdentityResolver};

pub const PATIENT_NAMESPACE: &str = "patient";
pub const DOCTOR_NAMESPACE: &str = "doctor";

/// Patient registration and lookup over the ledger's patient keyspace.
#[derive(Debug, Clone)]
pub struct PatientRegistry {
    store: EntityStore<PatientRecord>,
    resolver: IdentityResolver,
    retry: RetryPolicy,
}

impl PatientRegistry {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        resolver: IdentityResolver,
        retry: RetryPolicy,
    ) -> Self {
        PatientRegistry {
            store: EntityStore::new(ledger, PATIENT_NAMESPACE),
            resolver,
            retry,
        }
    }

    /// Resolve the credential and enroll the patient. The fingerprint path
    /// persists the record the matcher returned; a bare NID carries no
    /// demographics, so registration by NID goes through
    /// [`PatientRegistry::register`] with a full record instead.
    pub async fn resolve_and_register(&self, credential: &Credential) -> EhrResult<String> {
        match credential {
            Credential::Fingerprint(_) => {
                let resolved = self.resolver.resolve(credential).await?;
                let record = resolved.matched.ok_or_else(|| {
                    EhrError::IdentityNotResolved("matcher returned no citizen record".into())
                })?;
                self.persist_new(&resolved.patient_id, &record).await?;
                Ok(resolved.patient_id)
            }
            Credential::Nid(_) => Err(EhrError::IdentityNotResolved(
                "registration by NID requires the full demographic record".into(),
            )),
        }
    }

    /// Register a patient from an explicit demographic record.
    pub async fn register(&self, record: &PatientRecord) -> EhrResult<String> {
        if record.nid_no.trim().is_empty() {
            return Err(EhrError::IdentityNotResolved("empty NID number".into()));
        }
        let patient_id = record.patient_id();
        self.persist_new(&patient_id, record).await?;
        Ok(patient_id)
    }

    async fn persist_new(&self, patient_id: &str, record: &PatientRecord) -> EhrResult<()> {
        submit_with_retry(&self.retry, || {
            let store = self.store.clone();
            let record = record.clone();
            let patient_id = patient_id.to_string();
            async move { store.put_new(&patient_id, &record).await }
        })
        .await?;
        info!("registered patient {patient_id}");
        Ok(())
    }

    /// Resolve and load the patient record behind a credential.
    pub async fn find(&self, credential: &Credential) -> EhrResult<PatientRecord> {
        let resolved = self.resolver.resolve(credential).await?;
        self.store
            .get(&resolved.patient_id)
            .await?
            .ok_or(EhrError::PatientNotFound(resolved.patient_id))
    }

    pub async fn get(&self, patient_id: &str) -> EhrResult<Option<PatientRecord>> {
        self.store.get(patient_id).await
    }

    pub async fn exists(&self, patient_id: &str) -> EhrResult<bool> {
        self.store.exists(patient_id).await
    }

    pub async fn all(&self) -> EhrResult<Vec<PatientRecord>> {
        self.store.list().await
    }
}

/// Doctor registration and lookup; ids are the licensing number with a `d`
/// prefix, assigned administratively.
#[derive(Debug, Clone)]
pub struct DoctorRegistry {
    store: EntityStore<Doctor>,
    retry: RetryPolicy,
}

impl DoctorRegistry {
    pub fn new(ledger: Arc<dyn LedgerStore>, retry: RetryPolicy) -> Self {
        DoctorRegistry {
            store: EntityStore::new(ledger, DOCTOR_NAMESPACE),
            retry,
        }
    }

    pub async fn create(&self, bmdc_no: &str, name: &str) -> EhrResult<Doctor> {
        if bmdc_no.trim().is_empty() || name.trim().is_empty() {
            return Err(EhrError::Configuration(
                "doctor registration needs a licensing number and a name".into(),
            ));
        }
        let doctor = Doctor::from_licence(bmdc_no, name);
        submit_with_retry(&self.retry, || {
            let store = self.store.clone();
            let doctor = doctor.clone();
            async move { store.put_new(&doctor.doctor_id, &doctor).await }
        })
        .await?;
        info!("registered doctor {}", doctor.doctor_id);
        Ok(doctor)
    }

    pub async fn get(&self, doctor_id: &str) -> EhrResult<Doctor> {
        self.store
            .get(doctor_id)
            .await?
            .ok_or_else(|| EhrError::DoctorNotFound(doctor_id.to_string()))
    }

    pub async fn exists(&self, doctor_id: &str) -> EhrResult<bool> {
        self.store.exists(doctor_id).await
    }

    pub async fn all(&self) -> EhrResult<Vec<Doctor>> {
        self.store.list().await
    }
}
