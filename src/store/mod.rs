//! Persistence layer — process-local key-value store and its backends.

pub mod file;
pub mod keys;
pub mod memory;
pub mod traits;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::{KeyValueStore, read_json, write_json};
