#![forbid(unsafe_code)]

pub mod file_store;
pub mod records;
pub mod repository;

pub use file_store::FileStore;
pub use repository::{InMemoryStore, KeyValueStore, StorageError, keys};
