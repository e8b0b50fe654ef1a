use async_trait::async_trait;
use cache_aside::{CacheEntry, CacheStoreClient};
use chrono::Utc;
use shared::config::StoreConfig;
use shared::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Sled-backed store
///
/// `connection_string` is the base directory, the database is a sled database in
/// `<connection_string>/<database_name>` and the container is a tree inside it.
/// Entries are stored as JSON `CacheEntry` records carrying their expiry deadline.
#[derive(Clone)]
pub struct SledStore {
    path: PathBuf,
    tree: sled::Tree,
}

impl SledStore {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let base = config
            .connection_string
            .as_deref()
            .ok_or_else(|| Error::Config("sled store requires a connection string".into()))?;

        Self::open_at(
            Path::new(base).join(&config.database_name),
            &config.container_name,
            config.create_if_not_exists,
        )
    }

    /// Open the database at `path` and the `container` tree inside it.
    pub fn open_at(path: impl AsRef<Path>, container: &str, create_if_not_exists: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !create_if_not_exists && !path.exists() {
            return Err(Error::StoreUnavailable(format!(
                "database {} does not exist",
                path.display()
            )));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::StoreUnavailable(format!("Failed to create directory: {}", e)))?;
        }

        let db = sled::open(&path)
            .map_err(|e| Error::StoreUnavailable(format!("Failed to open Sled database: {}", e)))?;

        if !create_if_not_exists && !db.tree_names().iter().any(|name| &name[..] == container.as_bytes()) {
            return Err(Error::StoreUnavailable(format!(
                "container {} does not exist in {}",
                container,
                path.display()
            )));
        }

        let tree = db
            .open_tree(container)
            .map_err(|e| Error::StoreUnavailable(format!("Failed to open container: {}", e)))?;

        Ok(Self { path, tree })
    }

    fn read(tree: &sled::Tree, key: &str) -> Result<Option<String>> {
        let Some(raw) = tree.get(key).map_err(unavailable)? else {
            return Ok(None);
        };

        let entry: CacheEntry = serde_json::from_slice(&raw)
            .map_err(|e| Error::StoreUnavailable(format!("Failed to deserialize entry: {}", e)))?;

        if entry.is_expired(Utc::now()) {
            debug!(key, "removing expired entry");
            // Only remove the exact record we read, a concurrent overwrite wins
            let _ = tree
                .compare_and_swap(key, Some(&raw), None::<&[u8]>)
                .map_err(unavailable)?;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    fn write(tree: &sled::Tree, entry: &CacheEntry) -> Result<()> {
        let raw = serde_json::to_vec(entry)
            .map_err(|e| Error::StoreUnavailable(format!("Failed to serialize entry: {}", e)))?;

        tree.insert(entry.key.as_bytes(), raw).map_err(unavailable)?;
        tree.flush().map_err(unavailable)?;

        Ok(())
    }
}

fn unavailable(e: sled::Error) -> Error {
    Error::StoreUnavailable(e.to_string())
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::StoreUnavailable(format!("store task failed: {}", e)))?
}

#[async_trait]
impl CacheStoreClient for SledStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let tree = self.tree.clone();
        let key = key.to_string();
        blocking(move || Self::read(&tree, &key)).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let tree = self.tree.clone();
        let entry = CacheEntry::expiring(key, value, Utc::now(), ttl);
        blocking(move || Self::write(&tree, &entry)).await
    }
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("path", &self.path)
            .field("container", &String::from_utf8_lossy(&self.tree.name()))
            .finish()
    }
}
