//! One handle over everything persisted under the data directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lexi_domain::store::LanguageEntry;
use lexi_domain::{CommitId, Variant};
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::registry::RegistryStore;
use crate::stores::{AppConfigStore, JobsStore, LeaderboardStore};

/// The opened data plane: the four document stores plus the in-memory
/// catalog derived from the registry.
pub struct DataPlane {
    data_dir: PathBuf,
    pub leaderboard: LeaderboardStore,
    pub jobs: JobsStore,
    pub app_config: AppConfigStore,
    pub registry: RegistryStore,
    pub catalog: Catalog,
}

impl DataPlane {
    /// Opens (creating if needed) the data directory and every store in it,
    /// then publishes the first catalog snapshot.
    ///
    /// # Errors
    ///
    /// Fails when the data directory cannot be created or a store file
    /// cannot be read or seeded.
    pub fn open(config: &Config) -> Result<Self> {
        let data_dir = config.data().path.clone();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;
        debug!(path = %data_dir.display(), source = config.data().source, "opened data directory");

        let plane = DataPlane {
            leaderboard: LeaderboardStore::open(&data_dir),
            jobs: JobsStore::open(&data_dir),
            app_config: AppConfigStore::open(&data_dir),
            registry: RegistryStore::open(&data_dir),
            catalog: Catalog::new(&data_dir),
            data_dir,
        };
        plane.catalog.publish(&plane.registry.snapshot()?);
        Ok(plane)
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Registry activation plus catalog republish in one step.
    ///
    /// # Errors
    ///
    /// See [`RegistryStore::enable`].
    pub fn enable_language(
        &self,
        variant: Variant,
        commit: &CommitId,
        min_length: Option<u8>,
    ) -> Result<LanguageEntry> {
        let entry = self.registry.enable(variant, commit, min_length)?;
        self.catalog.publish(&self.registry.snapshot()?);
        Ok(entry)
    }

    /// Registry disable plus catalog republish in one step.
    ///
    /// # Errors
    ///
    /// See [`RegistryStore::disable`].
    pub fn disable_language(&self, id: &str) -> Result<()> {
        self.registry.disable(id)?;
        self.catalog.publish(&self.registry.snapshot()?);
        Ok(())
    }
}
