//! ConfigStore — the deployment record and its named assets.
//!
//! The trait is the seam the orchestrator depends on. `RedbConfigStore` is
//! the production implementation; it supports both on-disk and in-memory
//! backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use ciforge_core::Config;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Persistence for one named deployment.
pub trait ConfigStore {
    /// Whether a config record exists for this deployment.
    fn config_exists(&self) -> StateResult<bool>;

    /// Load the config record. Fails with `NotFound` when absent.
    fn load(&self) -> StateResult<Config>;

    /// Insert or overwrite the config record.
    fn update(&self, config: &Config) -> StateResult<()>;

    fn has_asset(&self, name: &str) -> StateResult<bool>;

    /// Load a named asset. Fails with `NotFound` when absent.
    fn load_asset(&self, name: &str) -> StateResult<Vec<u8>>;

    fn store_asset(&self, name: &str, contents: &[u8]) -> StateResult<()>;

    /// Delete a named asset. Deleting a missing asset is not an error.
    fn delete_asset(&self, name: &str) -> StateResult<()>;

    /// Delete the record and every asset of the deployment.
    fn delete_all(&self, config: &Config) -> StateResult<()>;
}

/// redb-backed [`ConfigStore`], scoped to one deployment name.
#[derive(Clone)]
pub struct RedbConfigStore {
    db: Arc<Database>,
    deployment: String,
}

impl RedbConfigStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path, deployment: &str) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self {
            db: Arc::new(db),
            deployment: deployment.to_string(),
        };
        store.ensure_tables()?;
        debug!(?path, %deployment, "config store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory(deployment: &str) -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self {
            db: Arc::new(db),
            deployment: deployment.to_string(),
        };
        store.ensure_tables()?;
        debug!(%deployment, "in-memory config store opened");
        Ok(store)
    }

    /// A handle on the same database scoped to another deployment.
    pub fn scoped(&self, deployment: &str) -> Self {
        Self {
            db: self.db.clone(),
            deployment: deployment.to_string(),
        }
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(CONFIGS).map_err(map_err!(Table))?;
        txn.open_table(ASSETS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn asset_key(&self, name: &str) -> String {
        format!("{}/{name}", self.deployment)
    }

    fn read(
        &self,
        table_def: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
    ) -> StateResult<Option<Vec<u8>>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_def).map_err(map_err!(Table))?;
        let value = table
            .get(key)
            .map_err(map_err!(Read))?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn write(
        &self,
        table_def: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
        value: &[u8],
    ) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table_def).map_err(map_err!(Table))?;
            table.insert(key, value).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}

impl ConfigStore for RedbConfigStore {
    fn config_exists(&self) -> StateResult<bool> {
        Ok(self.read(CONFIGS, &self.deployment)?.is_some())
    }

    fn load(&self) -> StateResult<Config> {
        let bytes = self
            .read(CONFIGS, &self.deployment)?
            .ok_or_else(|| StateError::NotFound(self.deployment.clone()))?;
        Config::from_json(&bytes).map_err(map_err!(Deserialize))
    }

    fn update(&self, config: &Config) -> StateResult<()> {
        let value = config.to_json().map_err(map_err!(Serialize))?;
        self.write(CONFIGS, &self.deployment, &value)?;
        debug!(deployment = %self.deployment, "config stored");
        Ok(())
    }

    fn has_asset(&self, name: &str) -> StateResult<bool> {
        Ok(self.read(ASSETS, &self.asset_key(name))?.is_some())
    }

    fn load_asset(&self, name: &str) -> StateResult<Vec<u8>> {
        let key = self.asset_key(name);
        self.read(ASSETS, &key)?
            .ok_or(StateError::NotFound(key))
    }

    fn store_asset(&self, name: &str, contents: &[u8]) -> StateResult<()> {
        let key = self.asset_key(name);
        self.write(ASSETS, &key, contents)?;
        debug!(%key, bytes = contents.len(), "asset stored");
        Ok(())
    }

    fn delete_asset(&self, name: &str) -> StateResult<()> {
        let key = self.asset_key(name);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(ASSETS).map_err(map_err!(Table))?;
            existed = table.remove(key.as_str()).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "asset deleted");
        Ok(())
    }

    fn delete_all(&self, config: &Config) -> StateResult<()> {
        let deployment = if config.deployment.is_empty() {
            self.deployment.as_str()
        } else {
            config.deployment.as_str()
        };
        let prefix = format!("{deployment}/");
        // Collect keys in a read transaction first.
        let mut keys = Vec::new();
        {
            let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
            let table = txn.open_table(ASSETS).map_err(map_err!(Table))?;
            for entry in table.iter().map_err(map_err!(Read))? {
                let (key, _) = entry.map_err(map_err!(Read))?;
                let key = key.value().to_string();
                if key.starts_with(&prefix) {
                    keys.push(key);
                }
            }
        }
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut assets = txn.open_table(ASSETS).map_err(map_err!(Table))?;
            for key in &keys {
                assets.remove(key.as_str()).map_err(map_err!(Write))?;
            }
            let mut configs = txn.open_table(CONFIGS).map_err(map_err!(Table))?;
            configs.remove(deployment).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%deployment, assets = keys.len(), "deployment records deleted");
        Ok(())
    }
}
