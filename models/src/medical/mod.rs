// models/src/medical/mod.rs

pub mod doctor;
pub mod ehr;
pub mod patient;
pub mod permission;
pub mod research;

pub use doctor::Doctor;
pub use ehr::{ClinicalDetails, EhrRecord, EhrWithDetails, Medications, TestResults};
pub use patient::PatientRecord;
pub use permission::PermissionGrant;
pub use research::{FilterMetadata, FilterSpec, FlatRecord, ResearchStats};
