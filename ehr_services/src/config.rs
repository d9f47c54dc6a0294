// ehr_services/src/config.rs

use std::env;
use std::time::Duration;

use ledger::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Process configuration, read once at startup. Every field has a default
/// suited to the local dev topology and an overriding environment variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// IPFS HTTP API endpoint.
    pub ipfs_endpoint: String,
    /// Biometric matcher service endpoint.
    pub matcher_endpoint: String,
    /// Per-call deadline on ledger submissions, in milliseconds.
    pub submit_deadline_ms: u64,
    /// Submit retry attempts on read conflicts.
    pub retry_max_attempts: u32,
    /// Base backoff between retries, in milliseconds (grows linearly).
    pub retry_backoff_ms: u64,
    /// Capacity of the content read cache, in entries.
    pub content_cache_capacity: u64,
    /// Fan-out limit for concurrent content fetches on the research path.
    pub research_fetch_concurrency: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            ipfs_endpoint: "http://localhost:5001".to_string(),
            matcher_endpoint: "http://localhost:15000".to_string(),
            submit_deadline_ms: 5_000,
            retry_max_attempts: 5,
            retry_backoff_ms: 100,
            content_cache_capacity: 1_024,
            research_fetch_concurrency: 8,
        }
    }
}

impl GatewayConfig {
    /// Defaults overridden by `EHR_*` environment variables. Unparseable
    /// numeric values fall back to the default rather than aborting startup.
    pub fn from_env() -> Self {
        let mut config = GatewayConfig::default();
        if let Ok(value) = env::var("EHR_IPFS_ENDPOINT") {
            config.ipfs_endpoint = value;
        }
        if let Ok(value) = env::var("EHR_MATCHER_ENDPOINT") {
            config.matcher_endpoint = value;
        }
        if let Some(value) = env_u64("EHR_SUBMIT_DEADLINE_MS") {
            config.submit_deadline_ms = value;
        }
        if let Some(value) = env_u64("EHR_RETRY_MAX_ATTEMPTS") {
            config.retry_max_attempts = value as u32;
        }
        if let Some(value) = env_u64("EHR_RETRY_BACKOFF_MS") {
            config.retry_backoff_ms = value;
        }
        if let Some(value) = env_u64("EHR_CONTENT_CACHE_CAPACITY") {
            config.content_cache_capacity = value;
        }
        if let Some(value) = env_u64("EHR_RESEARCH_FETCH_CONCURRENCY") {
            config.research_fetch_concurrency = value as usize;
        }
        config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }

    pub fn submit_deadline(&self) -> Duration {
        Duration::from_millis(self.submit_deadline_ms)
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::GatewayConfig;

    #[test]
    fn default_retry_policy_matches_submit_policy() {
        let policy = GatewayConfig::default().retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff_base.as_millis(), 100);
    }
}
