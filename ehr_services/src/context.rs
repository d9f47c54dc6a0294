// ehr_services/src/context.rs

use std::sync::Arc;

use biometric::{BiometricMatcher, HttpMatcher, StaticMatcher};
use content_store::{CachedContentStore, ContentStore, InMemoryContentStore, IpfsClient};
use ledger::{InMemoryLedger, LedgerStore};

use crate::config::GatewayConfig;
use crate::ehr::EhrService;
use crate::identity::IdentityResolver;
use crate::permission::PermissionService;
use crate::registry::{DoctorRegistry, PatientRegistry};
use crate::research::ResearchService;

/// All collaborator handles, constructed once at process start and passed
/// down explicitly. Replaces the legacy module-level gateway singletons.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: GatewayConfig,
    pub ledger: Arc<dyn LedgerStore>,
    pub content: Arc<dyn ContentStore>,
    pub matcher: Arc<dyn BiometricMatcher>,
}

impl AppContext {
    pub fn new(
        config: GatewayConfig,
        ledger: Arc<dyn LedgerStore>,
        content: Arc<dyn ContentStore>,
        matcher: Arc<dyn BiometricMatcher>,
    ) -> Self {
        AppContext {
            config,
            ledger,
            content,
            matcher,
        }
    }

    /// Production wiring: IPFS-backed content store behind the read cache,
    /// HTTP biometric matcher, endpoints and policies from `config`.
    pub fn connect(config: GatewayConfig, ledger: Arc<dyn LedgerStore>) -> Self {
        let ipfs = Arc::new(IpfsClient::new(config.ipfs_endpoint.clone()));
        let content = Arc::new(CachedContentStore::new(ipfs, config.content_cache_capacity));
        let matcher = Arc::new(HttpMatcher::new(config.matcher_endpoint.clone()));
        AppContext::new(config, ledger, content, matcher)
    }

    /// Fully in-process wiring for tests and demos.
    pub fn in_memory(matcher: StaticMatcher) -> Self {
        AppContext::new(
            GatewayConfig::default(),
            Arc::new(InMemoryLedger::new()),
            Arc::new(InMemoryContentStore::new()),
            Arc::new(matcher),
        )
    }

    pub fn services(&self) -> Services {
        let retry = self.config.retry_policy();
        let resolver = IdentityResolver::new(self.matcher.clone());
        let patients = PatientRegistry::new(self.ledger.clone(), resolver.clone(), retry);
        let doctors = DoctorRegistry::new(self.ledger.clone(), retry);
        let permissions = PermissionService::new(self.ledger.clone(), retry);
        let ehr = EhrService::new(
            self.ledger.clone(),
            self.content.clone(),
            resolver,
            patients.clone(),
            doctors.clone(),
            permissions.clone(),
            retry,
            self.config.submit_deadline(),
        );
        let research = ResearchService::new(
            ehr.records(),
            self.content.clone(),
            self.config.research_fetch_concurrency,
        );
        Services {
            patients,
            doctors,
            permissions,
            ehr,
            research,
        }
    }
}

/// The assembled service set; cheap to clone, everything shares the same
/// underlying collaborators.
#[derive(Debug, Clone)]
pub struct Services {
    pub patients: PatientRegistry,
    pub doctors: DoctorRegistry,
    pub permissions: PermissionService,
    pub ehr: EhrService,
    pub research: ResearchService,
}
