//! Session storage backends.
pub mod disk;
pub mod memory;

use crate::core::session::SessionStore;
use std::path::Path;
use tracing::warn;

/// Opens the on-disk store under `data_path`, falling back to an in-memory
/// store when the directory cannot be used.
pub fn open_session_store(data_path: &Path) -> Box<dyn SessionStore> {
    match disk::DiskStore::open(&data_path.join("session")) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = ?e, path = %data_path.display(), "Session will not persist");
            Box::new(memory::MemoryStore::new())
        }
    }
}

