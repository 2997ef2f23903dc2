use anyhow::anyhow;
use notify::RecommendedWatcher;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, read_to_string, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

pub use notify::{RecursiveMode, Watcher};

pub mod notifications;
pub use crate::config::notifications::Load;

pub mod adjustment;
pub use crate::config::adjustment::AdjustmentConfig;

pub mod permissions;
pub use crate::config::permissions::PermissionsConfig;

pub mod silence;
pub use crate::config::silence::SilenceConfig;

#[cfg(feature = "logging")]
pub mod logging;
#[cfg(feature = "logging")]
pub use crate::config::logging::LoggingConfig;

#[cfg(feature = "db")]
pub mod db;
#[cfg(feature = "db")]
pub use crate::config::db::{BackendKind, DbConfig};

#[cfg(feature = "db")]
use hush_db::{ComponentGate, SilenceStore};
#[cfg(feature = "db")]
use tokio::task::JoinHandle;
#[cfg(feature = "db")]
use hush_db::CancellationToken;

pub const CONFIG: &str = "Config.toml";

#[derive(Debug, Clone)]
pub struct Config {
    inner: Arc<Mutex<InnerConfig>>,
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct InnerConfig {
    pub permissions: PermissionsConfig,
    pub adjustment: AdjustmentConfig,
    pub silence: SilenceConfig,
    #[cfg(feature = "logging")]
    pub logs: LoggingConfig,
    #[cfg(feature = "db")]
    pub db: DbConfig,
}

// Impls
impl Load for InnerConfig {
    fn load(path: &Path) -> anyhow::Result<Self> {
        match read_to_string(path) {
            Ok(s) => toml::from_str(&s).map_err(|e| anyhow!(e)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let config = Self::default();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    create_dir_all(parent)?;
                }
                let mut f = File::create(path)?;
                f.write_all(toml::to_string(&config)?.as_bytes())?;
                info!(target: "Config", "Wrote default configuration to {}", path.display());
                Ok(config)
            }
            Err(e) => Err(anyhow!("Error reading {}, {e}", path.display())),
        }
    }
}

impl Config {
    /// Loads `path`, writing a default file there first if it does not exist.
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let inner_config = InnerConfig::load(&path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(inner_config)),
            path,
        })
    }

    pub fn load_default() -> anyhow::Result<Self> {
        Self::load(CONFIG)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Starts watching the file; edits are picked up for as long as the
    /// returned watcher is alive.
    pub fn init(&self) -> anyhow::Result<RecommendedWatcher> {
        let mut watcher = notifications::initialize(Arc::clone(&self.inner), self.path.clone())?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        Ok(watcher)
    }

    pub fn arc_clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            path: self.path.clone(),
        }
    }

    pub fn permissions(&self) -> anyhow::Result<PermissionsConfig> {
        let inner = self.inner.lock().map_err(|e| anyhow!("Error, {e}"))?;
        Ok(inner.permissions.clone())
    }

    pub fn adjustment(&self) -> anyhow::Result<AdjustmentConfig> {
        let inner = self.inner.lock().map_err(|e| anyhow!("Error, {e}"))?;
        Ok(inner.adjustment.clone())
    }

    pub fn silence(&self) -> anyhow::Result<SilenceConfig> {
        let inner = self.inner.lock().map_err(|e| anyhow!("Error, {e}"))?;
        Ok(inner.silence.clone())
    }

    #[cfg(feature = "logging")]
    pub fn logs(&self) -> anyhow::Result<LoggingConfig> {
        let inner = self.inner.lock().map_err(|e| anyhow!("Error, {e}"))?;
        Ok(inner.logs.clone())
    }

    #[cfg(feature = "db")]
    pub fn db_config(&self) -> anyhow::Result<DbConfig> {
        let inner = self.inner.lock().map_err(|e| anyhow!("Error, {e}"))?;
        Ok(inner.db.clone())
    }

    /// Builds the store described by the `db` section.
    #[cfg(feature = "db")]
    pub async fn open_store(&self, gate: Arc<dyn ComponentGate>) -> anyhow::Result<Arc<SilenceStore>> {
        let db = self.db_config()?;
        let store = db.open_store(gate).await?;
        info!(target: "Config", "{db}");
        Ok(Arc::new(store))
    }

    /// Spawns the background sweeper when `silence.sweep_interval_secs` is set.
    #[cfg(feature = "db")]
    pub fn spawn_sweeper(
        &self,
        store: &Arc<SilenceStore>,
        cancel: CancellationToken,
    ) -> anyhow::Result<Option<JoinHandle<()>>> {
        Ok(self
            .silence()?
            .sweep_interval()
            .map(|every| store.spawn_sweeper(every, cancel)))
    }
}
