use std::path::Path;

use async_trait::async_trait;
use chrono::DateTime;
use toasty::Db;
use tracing::{debug, info};

use crate::db::silence_channel::SilenceChannel;
use crate::db::{Backend, DisabledCapabilities, SilenceRecord};
use crate::{Error, Result};

/// Embedded SQLite storage through toasty, one row per silenced channel.
pub struct SqliteBackend {
    db: Db,
}

impl SqliteBackend {
    pub async fn new_memory() -> anyhow::Result<Self> {
        let db = Self::connect("sqlite::memory:").await?;
        db.reset_db().await?;
        Ok(Self { db })
    }

    /// Opens the database file at `path`, creating the schema on first use.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        let fresh = !path.exists();
        let db = Self::connect(&format!("sqlite:{}", path.display())).await?;
        if fresh {
            db.reset_db().await?;
            info!(target: "SqliteBackend", "Created silence database {}", path.display());
        }
        Ok(Self { db })
    }

    async fn connect(url: &str) -> anyhow::Result<Db> {
        let db = Db::builder()
            .register::<SilenceChannel>()
            .connect(url)
            .await?;
        Ok(db)
    }

    /// Only a missing row maps to `None`; driver failures are returned.
    async fn row(&self, channel_id: &str) -> Result<Option<SilenceChannel>> {
        let row = SilenceChannel::filter_by_channel_id(channel_id.to_string())
            .first(&self.db)
            .await
            .map_err(|e| anyhow::anyhow!("Error reading channel {channel_id}, {e}"))?;
        if row.is_none() {
            debug!(target: "SqliteBackend", "Channel {channel_id} not in database");
        }
        Ok(row)
    }
}

fn into_record(row: SilenceChannel) -> Result<SilenceRecord> {
    let expires_at = match row.expires_at {
        Some(micros) => Some(DateTime::from_timestamp_micros(micros).ok_or_else(|| {
            Error::message(format!("Expiry timestamp out of range {micros}"))
        })?),
        None => None,
    };
    let actions: Vec<String> = serde_json::from_str(&row.disabled_actions)?;
    let commands: Vec<String> = serde_json::from_str(&row.disabled_commands)?;
    Ok(SilenceRecord {
        channel_id: row.channel_id,
        expires_at,
        disabled: DisabledCapabilities::new(actions, commands),
    })
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn load(&self, channel_id: &str) -> Result<Option<SilenceRecord>> {
        self.row(channel_id).await?.map(into_record).transpose()
    }

    async fn load_all(&self) -> Result<Vec<SilenceRecord>> {
        let rows: Vec<SilenceChannel> = SilenceChannel::all()
            .collect(&self.db)
            .await
            .map_err(|e| anyhow::anyhow!("Error listing channels, {e}"))?;
        rows.into_iter().map(into_record).collect()
    }

    async fn save(&self, record: &SilenceRecord) -> Result<()> {
        let actions = serde_json::to_string(&record.disabled.actions)?;
        let commands = serde_json::to_string(&record.disabled.commands)?;
        let expires_at = record.expires_at.map(|at| at.timestamp_micros());

        // Update in place so a failed write never drops the previous row.
        if let Some(mut row) = self.row(&record.channel_id).await? {
            row.update()
                .expires_at(expires_at)
                .disabled_actions(actions)
                .disabled_commands(commands)
                .exec(&self.db)
                .await
                .map_err(|e| anyhow::anyhow!("Error updating channel, {e}"))?;
            return Ok(());
        }

        let mut create = SilenceChannel::create()
            .channel_id(record.channel_id.clone())
            .disabled_actions(actions)
            .disabled_commands(commands);
        if let Some(micros) = expires_at {
            create = create.expires_at(micros);
        }
        create
            .exec(&self.db)
            .await
            .map_err(|e| anyhow::anyhow!("Error saving channel, {e}"))?;
        Ok(())
    }

    async fn delete(&self, channel_id: &str) -> Result<bool> {
        match self.row(channel_id).await? {
            Some(row) => {
                row.delete(&self.db)
                    .await
                    .map_err(|e| anyhow::anyhow!("Error deleting channel, {e}"))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
