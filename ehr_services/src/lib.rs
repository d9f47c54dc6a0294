// ehr_services/src/lib.rs
//! Orchestration core of the EHR ledger demo: identity resolution,
//! patient/doctor registries, the permission state machine, the EHR access
//! controller, and the research aggregator. All collaborators (ledger,
//! content store, biometric matcher) arrive through [`AppContext`]; nothing
//! here holds ambient global state.

pub mod config;
pub mod context;
pub mod ehr;
pub mod identity;
pub mod permission;
pub mod registry;
pub mod research;

pub use config::GatewayConfig;
pub use context::{AppContext, Services};
pub use ehr::{EhrService, PatientEhrs};
pub use identity::{Credential, IdentityResolver, ResolvedIdentity};
pub use permission::PermissionService;
pub use registry::{DoctorRegistry, PatientRegistry};
pub use research::{CsvExport, Preview, ResearchService};
