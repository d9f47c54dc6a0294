// biometric/src/lib.rs

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use log::debug;
use models::{EhrError, EhrResult, PatientRecord};
use serde::Deserialize;

/// Fingerprint matcher collaborator. A successful match returns the
/// citizen's demographic record (including the NID the identity hash is
/// derived from); no match is `Ok(None)`. Transport failures are errors;
/// the resolver surfaces both the same way and never retries.
#[async_trait]
pub trait BiometricMatcher: Send + Sync + Debug {
    async fn match_fingerprint(&self, image: &[u8]) -> EhrResult<Option<PatientRecord>>;
}

/// Client for the external matcher service: the image goes up as a
/// multipart form field named `image`, the response carries `citizen_data`.
#[derive(Debug, Clone)]
pub struct HttpMatcher {
    endpoint: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MatchResponse {
    citizen_data: Option<PatientRecord>,
}

impl HttpMatcher {
    pub fn new(endpoint: impl Into<String>) -> Self {
        HttpMatcher {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl BiometricMatcher for HttpMatcher {
    async fn match_fingerprint(&self, image: &[u8]) -> EhrResult<Option<PatientRecord>> {
        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name("fingerprint.bmp")
            .mime_str("image/bmp")
            .map_err(|err| EhrError::IdentityNotResolved(format!("matcher upload: {err}")))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .http
            .post(format!("{}/match", self.endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(|err| EhrError::IdentityNotResolved(format!("matcher call: {err}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(EhrError::IdentityNotResolved(format!(
                "matcher returned status {}",
                response.status()
            )));
        }

        let matched: MatchResponse = response
            .json()
            .await
            .map_err(|err| EhrError::IdentityNotResolved(format!("matcher response: {err}")))?;
        debug!(
            "matcher response: {}",
            if matched.citizen_data.is_some() {
                "match"
            } else {
                "no match"
            }
        );
        Ok(matched.citizen_data)
    }
}

/// Enrollment-table matcher for tests and demos: exact image bytes map to a
/// citizen record.
#[derive(Debug, Default)]
pub struct StaticMatcher {
    enrolled: HashMap<Vec<u8>, PatientRecord>,
}

impl StaticMatcher {
    pub fn new() -> Self {
        StaticMatcher::default()
    }

    pub fn enroll(&mut self, image: impl Into<Vec<u8>>, record: PatientRecord) {
        self.enrolled.insert(image.into(), record);
    }
}

#[async_trait]
impl BiometricMatcher for StaticMatcher {
    async fn match_fingerprint(&self, image: &[u8]) -> EhrResult<Option<PatientRecord>> {
        Ok(self.enrolled.get(image).cloned())
    }
}
