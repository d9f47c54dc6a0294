// models/src/lib.rs

pub mod errors;
pub mod hashing;
pub mod medical;

pub use errors::{EhrError, EhrResult};
pub use medical::{
    ClinicalDetails, Doctor, EhrRecord, EhrWithDetails, FilterMetadata, FilterSpec, FlatRecord,
    Medications, PatientRecord, PermissionGrant, ResearchStats, TestResults,
};
