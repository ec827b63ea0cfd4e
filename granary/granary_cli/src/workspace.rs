//! Snapshot-backed store for the CLI
//!
//! Each invocation loads the whole store from a JSON snapshot, runs one
//! command against it, and writes it back if the command changed anything.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use granary_core::config::EngineConfig;
use granary_permissions::store::{InMemoryGrainStore, StoreSnapshot};
use granary_permissions::PermissionEngine;

/// A loaded snapshot and the engine over it
pub struct Workspace {
    path: PathBuf,
    store: Arc<InMemoryGrainStore>,
    engine: PermissionEngine,
}

impl Workspace {
    /// Write an empty snapshot to `path`, refusing to overwrite one
    pub fn create(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Snapshot already exists: {}", path.display());
        }
        StoreSnapshot::default()
            .write_to(path)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        info!("Created empty snapshot at {}", path.display());
        Ok(())
    }

    /// Load the snapshot at `path`
    pub fn open(path: &Path, config: EngineConfig) -> Result<Self> {
        let snapshot = StoreSnapshot::read_from(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        debug!(
            "Loaded {} grains, {} accounts and {} tokens",
            snapshot.grains.len(),
            snapshot.accounts.len(),
            snapshot.tokens.len()
        );

        let store = Arc::new(
            InMemoryGrainStore::from_snapshot(snapshot).context("Snapshot is inconsistent")?,
        );
        let engine = PermissionEngine::with_config(store.clone(), config);

        Ok(Self {
            path: path.to_path_buf(),
            store,
            engine,
        })
    }

    pub fn engine(&self) -> &PermissionEngine {
        &self.engine
    }

    pub fn store(&self) -> &InMemoryGrainStore {
        &self.store
    }

    /// Write the store back to the snapshot it was loaded from
    pub fn save(&self) -> Result<()> {
        self.store
            .snapshot()
            .write_to(&self.path)
            .with_context(|| format!("Failed to write snapshot {}", self.path.display()))
    }
}
