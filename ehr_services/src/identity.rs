// ehr_services/src/identity.rs

use std::sync::Arc;

use biometric::BiometricMatcher;
use log::debug;
use models::hashing::nid_hash;
use models::{EhrError, EhrResult, PatientRecord};

/// Credential a patient presents to identify themselves.
#[derive(Debug, Clone)]
pub enum Credential {
    Nid(String),
    Fingerprint(Vec<u8>),
}

/// Outcome of identity resolution. The biometric path also yields the
/// matched demographic record; the NID path carries only the derived id.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub patient_id: String,
    pub matched: Option<PatientRecord>,
}

/// Maps a presented credential to the stable patient id. The NID path is a
/// pure hash; the fingerprint path makes exactly one matcher call, with no
/// retries.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    matcher: Arc<dyn BiometricMatcher>,
}

impl IdentityResolver {
    pub fn new(matcher: Arc<dyn BiometricMatcher>) -> Self {
        IdentityResolver { matcher }
    }

    pub async fn resolve(&self, credential: &Credential) -> EhrResult<ResolvedIdentity> {
        match credential {
            Credential::Nid(nid_no) => {
                if nid_no.trim().is_empty() {
                    return Err(EhrError::IdentityNotResolved("empty NID number".into()));
                }
                Ok(ResolvedIdentity {
                    patient_id: nid_hash(nid_no),
                    matched: None,
                })
            }
            Credential::Fingerprint(image) => {
                let matched = self.matcher.match_fingerprint(image).await?;
                match matched {
                    Some(record) => {
                        let patient_id = nid_hash(&record.nid_no);
                        debug!("fingerprint matched citizen, id {patient_id}");
                        Ok(ResolvedIdentity {
                            patient_id,
                            matched: Some(record),
                        })
                    }
                    None => Err(EhrError::IdentityNotResolved(
                        "fingerprint did not match any enrolled citizen".into(),
                    )),
                }
            }
        }
    }
}
