// ehr_services/src/permission.rs

use std::sync::Arc;

use chrono::Utc;
use ledger::{submit_with_retry, EntityStore, LedgerStore, RetryPolicy};
use log::info;
use models::{EhrError, EhrResult, PermissionGrant};

pub const PERMISSION_NAMESPACE: &str = "permission";

/// Access-grant state machine between a doctor and a patient:
/// none → pending → granted, with denial or revocation removing the entry
/// outright. A removed pair can only re-enter through a fresh request.
#[derive(Debug, Clone)]
pub struct PermissionService {
    store: EntityStore<PermissionGrant>,
    retry: RetryPolicy,
}

impl PermissionService {
    pub fn new(ledger: Arc<dyn LedgerStore>, retry: RetryPolicy) -> Self {
        PermissionService {
            store: EntityStore::new(ledger, PERMISSION_NAMESPACE),
            retry,
        }
    }

    /// Doctor-initiated request; one live entry per pair, whether pending
    /// or already granted.
    pub async fn request(&self, patient_id: &str, doctor_id: &str) -> EhrResult<PermissionGrant> {
        let key = PermissionGrant::pair_key(patient_id, doctor_id);
        if self.store.exists(&key).await? {
            return Err(EhrError::DuplicateRequest {
                patient_id: patient_id.to_string(),
                doctor_id: doctor_id.to_string(),
            });
        }
        let grant = PermissionGrant::pending(patient_id, doctor_id);
        submit_with_retry(&self.retry, || {
            let store = self.store.clone();
            let grant = grant.clone();
            let key = key.clone();
            async move { store.put(&key, &grant).await }
        })
        .await?;
        info!("permission requested by {doctor_id} for patient {patient_id}");
        Ok(grant)
    }

    /// Patient response. Approval stamps the grant. Denial, and likewise
    /// revocation of an earlier approval, deletes the entry, leaving the
    /// pair indistinguishable from never-asked.
    pub async fn respond(
        &self,
        patient_id: &str,
        doctor_id: &str,
        granted: bool,
    ) -> EhrResult<Option<PermissionGrant>> {
        let key = PermissionGrant::pair_key(patient_id, doctor_id);
        let mut grant = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| EhrError::PermissionNotFound {
                patient_id: patient_id.to_string(),
                doctor_id: doctor_id.to_string(),
            })?;

        if granted {
            grant.permission_given = true;
            grant.updated_date = Some(Utc::now());
            submit_with_retry(&self.retry, || {
                let store = self.store.clone();
                let grant = grant.clone();
                let key = key.clone();
                async move { store.put(&key, &grant).await }
            })
            .await?;
            info!("patient {patient_id} granted access to {doctor_id}");
            Ok(Some(grant))
        } else {
            submit_with_retry(&self.retry, || {
                let store = self.store.clone();
                let key = key.clone();
                async move { store.delete(&key).await }
            })
            .await?;
            info!("patient {patient_id} removed access for {doctor_id}");
            Ok(None)
        }
    }

    /// True iff an active, approved grant exists for the pair.
    pub async fn check(&self, patient_id: &str, doctor_id: &str) -> EhrResult<bool> {
        let key = PermissionGrant::pair_key(patient_id, doctor_id);
        Ok(self
            .store
            .get(&key)
            .await?
            .map(|grant| grant.permission_given)
            .unwrap_or(false))
    }

    /// Unanswered requests for the patient's approval queue.
    pub async fn pending_for_patient(&self, patient_id: &str) -> EhrResult<Vec<PermissionGrant>> {
        let grants = self.store.list_prefix(&format!("{patient_id}:")).await?;
        Ok(grants
            .into_iter()
            .filter(|grant| !grant.permission_given)
            .collect())
    }

    /// Every live entry for the patient, pending or granted.
    pub async fn all_for_patient(&self, patient_id: &str) -> EhrResult<Vec<PermissionGrant>> {
        self.store.list_prefix(&format!("{patient_id}:")).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger::{InMemoryLedger, RetryPolicy};
    use models::EhrError;

    use super::PermissionService;

    fn service() -> PermissionService {
        PermissionService::new(Arc::new(InMemoryLedger::new()), RetryPolicy::default())
    }

    #[tokio::test]
    async fn request_then_grant_then_check() {
        let permissions = service();
        let grant = permissions.request("p1", "d0001").await.unwrap();
        assert!(!grant.permission_given);
        assert!(!permissions.check("p1", "d0001").await.unwrap());

        let granted = permissions
            .respond("p1", "d0001", true)
            .await
            .unwrap()
            .unwrap();
        assert!(granted.permission_given);
        assert!(granted.updated_date.is_some());
        assert!(permissions.check("p1", "d0001").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_request_is_rejected_in_pending_and_granted_states() {
        let permissions = service();
        permissions.request("p1", "d0001").await.unwrap();
        let err = permissions.request("p1", "d0001").await.unwrap_err();
        assert!(matches!(err, EhrError::DuplicateRequest { .. }));

        permissions.respond("p1", "d0001", true).await.unwrap();
        let err = permissions.request("p1", "d0001").await.unwrap_err();
        assert!(matches!(err, EhrError::DuplicateRequest { .. }));
    }

    #[tokio::test]
    async fn denial_removes_the_entry_and_allows_a_fresh_request() {
        let permissions = service();
        permissions.request("p1", "d0001").await.unwrap();
        assert_eq!(permissions.respond("p1", "d0001", false).await.unwrap(), None);
        assert!(!permissions.check("p1", "d0001").await.unwrap());
        assert!(permissions.pending_for_patient("p1").await.unwrap().is_empty());

        // Pair is back to never-asked; a new request goes through.
        permissions.request("p1", "d0001").await.unwrap();
    }

    #[tokio::test]
    async fn revocation_after_grant_removes_the_entry() {
        let permissions = service();
        permissions.request("p1", "d0001").await.unwrap();
        permissions.respond("p1", "d0001", true).await.unwrap();
        assert!(permissions.check("p1", "d0001").await.unwrap());

        permissions.respond("p1", "d0001", false).await.unwrap();
        assert!(!permissions.check("p1", "d0001").await.unwrap());
    }

    #[tokio::test]
    async fn responding_to_a_missing_request_is_not_found() {
        let permissions = service();
        let err = permissions.respond("p1", "d0001", true).await.unwrap_err();
        assert!(matches!(err, EhrError::PermissionNotFound { .. }));
    }

    #[tokio::test]
    async fn pending_list_is_scoped_to_the_patient() {
        let permissions = service();
        permissions.request("p1", "d0001").await.unwrap();
        permissions.request("p1", "d0002").await.unwrap();
        permissions.request("p2", "d0001").await.unwrap();
        permissions.respond("p1", "d0002", true).await.unwrap();

        let pending = permissions.pending_for_patient("p1").await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].doctor_id, "d0001");
        assert_eq!(permissions.all_for_patient("p1").await.unwrap().len(), 2);
    }
}
