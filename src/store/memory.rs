use crate::core::session::SessionStore;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::Mutex;

/// Non-persistent session store, used when no data directory is available
/// and in tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let map = self.inner.lock().map_err(|_| anyhow!("Session store poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut map = self.inner.lock().map_err(|_| anyhow!("Session store poisoned"))?;
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.inner.lock().map_err(|_| anyhow!("Session store poisoned"))?;
        map.remove(key);
        Ok(())
    }
}
