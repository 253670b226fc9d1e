//! Session store backends

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use sesscgi_core::{SessionConfig, SessionStore, StoreBackend};
use std::sync::Arc;

/// Build the backend selected by configuration
pub fn create_store(config: &SessionConfig) -> Arc<dyn SessionStore> {
    match config.backend {
        StoreBackend::File => Arc::new(FileSessionStore::new(config.session_dir_path())),
        StoreBackend::Memory => Arc::new(MemorySessionStore::new()),
    }
}
