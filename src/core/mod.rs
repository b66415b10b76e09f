// Core business logic module

pub mod bin_monitor;
pub mod config;
pub mod protocol;
pub mod storage;
pub mod transport;

// Re-export commonly used items
pub use bin_monitor::{DeviceState, StateStore};
pub use config::Settings;
pub use storage::{BlobStore, FileBlobStore, MemoryBlobStore};
