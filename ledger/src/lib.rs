// ledger/src/lib.rs

pub mod entity;
pub mod retry;
pub mod store;

pub use entity::EntityStore;
pub use retry::{submit_with_retry, RetryPolicy};
pub use store::{InMemoryLedger, LedgerStore};
