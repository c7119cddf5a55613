use crate::core::session::SessionStore;
use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "session";

/// Session store backed by a fjall keyspace.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open keyspace at {}", path.display()))?;
        let partition = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace,
            partition,
        })
    }

    fn flush(&self) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

impl SessionStore for DiskStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.partition.get(key)?.map(|v| v.to_vec());
        debug!(key, hit = value.is_some(), "Session store GET");
        Ok(value)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.partition.insert(key, value)?;
        debug!(key, "Session store PUT");
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.partition.remove(key)?;
        debug!(key, "Session store REMOVE");
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_disk_store_get_put_remove() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        assert!(store.get("oracle_user").unwrap().is_none());

        store.put("oracle_user", b"{\"id\":3}").unwrap();
        assert_eq!(
            store.get("oracle_user").unwrap().as_deref(),
            Some(&b"{\"id\":3}"[..])
        );

        store.remove("oracle_user").unwrap();
        assert!(store.get("oracle_user").unwrap().is_none());
    }

    #[test]
    fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = DiskStore::open(dir.path()).unwrap();
            store.put("oracle_user", b"saved").unwrap();
        }

        let reopened = DiskStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("oracle_user").unwrap().as_deref(),
            Some(&b"saved"[..])
        );
    }
}
