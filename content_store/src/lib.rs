// content_store/src/lib.rs

pub mod cached;
pub mod ipfs;
pub mod store;

pub use cached::CachedContentStore;
pub use ipfs::IpfsClient;
pub use store::{ContentStore, InMemoryContentStore};
