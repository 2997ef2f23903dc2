use core::fmt;
use std::sync::Arc;

use hush_db::{ComponentGate, SilenceStore};
use serde::{Deserialize, Serialize};

const PATH: &str = "data/silence_restrictions.json";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DbConfig {
    pub backend: BackendKind,
    pub path: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: default_path(),
        }
    }
}

impl DbConfig {
    pub async fn open_store(&self, gate: Arc<dyn ComponentGate>) -> anyhow::Result<SilenceStore> {
        match self.backend {
            BackendKind::Memory => Ok(SilenceStore::new_memory(gate)),
            BackendKind::Json => Ok(SilenceStore::open_json(&self.path, gate).await?),
            #[cfg(feature = "sqlite")]
            BackendKind::Sqlite => Ok(SilenceStore::open_sqlite(&self.path, gate).await?),
            #[cfg(not(feature = "sqlite"))]
            BackendKind::Sqlite => Err(anyhow::anyhow!(
                "Error, the sqlite backend needs the `sqlite` feature"
            )),
        }
    }
}

impl fmt::Display for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Database Configuration: Backend = {:?}, Path = {}",
            self.backend, self.path
        )
    }
}

fn default_path() -> String {
    PATH.to_string()
}
