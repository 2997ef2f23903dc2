use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

pub mod json_file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod silence_channel;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use json_file::JsonFileBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

/// Capabilities turned off when a silence started, restored verbatim when it ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledCapabilities {
    pub actions: BTreeSet<String>,
    pub commands: BTreeSet<String>,
}

impl DisabledCapabilities {
    pub fn new<A, C>(actions: A, commands: C) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            actions: actions.into_iter().map(Into::into).collect(),
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.commands.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilenceRecord {
    pub channel_id: String,
    /// `None` means silenced until explicitly removed.
    pub expires_at: Option<DateTime<Utc>>,
    pub disabled: DisabledCapabilities,
}

impl SilenceRecord {
    /// Inclusive: a record expiring exactly at `now` is already expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Durable mapping of channel id to its silence record.
///
/// Backends are not expected to serialize concurrent read-modify-write
/// sequences themselves; `SilenceStore` holds a lock around every call.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn load(&self, channel_id: &str) -> Result<Option<SilenceRecord>>;
    async fn load_all(&self) -> Result<Vec<SilenceRecord>>;
    /// Inserts or replaces the record for `record.channel_id`.
    async fn save(&self, record: &SilenceRecord) -> Result<()>;
    /// Returns whether a record was actually deleted.
    async fn delete(&self, channel_id: &str) -> Result<bool>;
}
