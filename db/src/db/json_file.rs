use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::db::{Backend, DisabledCapabilities, SilenceRecord};
use crate::{Error, Result};

/// On-disk shape of one channel, shared with older hosts. Expiry is unix
/// seconds under `expiration`; `expires_at` is also read.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEntry {
    #[serde(default, rename = "expiration", alias = "expires_at")]
    expires_at: Option<f64>,
    #[serde(default)]
    disabled_actions: Vec<String>,
    #[serde(default)]
    disabled_commands: Vec<String>,
}

type Document = BTreeMap<String, StoredEntry>;

fn to_unix_secs(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

fn from_unix_secs(secs: f64) -> Result<DateTime<Utc>> {
    if !secs.is_finite() {
        return Err(Error::message(format!("Invalid expiry timestamp {secs}")));
    }
    DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
        .ok_or_else(|| Error::message(format!("Expiry timestamp out of range {secs}")))
}

impl StoredEntry {
    fn from_record(record: &SilenceRecord) -> Self {
        Self {
            expires_at: record.expires_at.map(to_unix_secs),
            disabled_actions: record.disabled.actions.iter().cloned().collect(),
            disabled_commands: record.disabled.commands.iter().cloned().collect(),
        }
    }

    fn into_record(self, channel_id: String) -> Result<SilenceRecord> {
        Ok(SilenceRecord {
            channel_id,
            expires_at: self.expires_at.map(from_unix_secs).transpose()?,
            disabled: DisabledCapabilities::new(self.disabled_actions, self.disabled_commands),
        })
    }
}

/// Every channel in one pretty-printed JSON object, rewritten atomically on
/// each change. The previous version is kept next to it as `.bak`.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Opens the document at `path`, creating an empty one if needed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let backend = Self { path: path.into() };
        backend.ensure_file().await?;
        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_file(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        if !fs::try_exists(&self.path).await? {
            self.write_document(&Document::new()).await?;
            info!(target: "JsonFileBackend", "Created silence file {}", self.path.display());
        }
        Ok(())
    }

    async fn read_document(&self) -> Result<Document> {
        let data = fs::read_to_string(&self.path).await?;
        if data.trim().is_empty() {
            return Ok(Document::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    async fn write_document(&self, document: &Document) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;

        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let bak = self.path.with_extension("json.bak");
            if let Err(e) = fs::copy(&self.path, &bak).await {
                warn!(target: "JsonFileBackend", "Error backing up {}, {e}", self.path.display());
            }
        }

        fs::rename(&tmp, &self.path).await?;
        debug!(target: "JsonFileBackend", "Wrote {} channels", document.len());
        Ok(())
    }
}

#[async_trait]
impl Backend for JsonFileBackend {
    async fn load(&self, channel_id: &str) -> Result<Option<SilenceRecord>> {
        let mut document = self.read_document().await?;
        document
            .remove(channel_id)
            .map(|entry| entry.into_record(channel_id.to_string()))
            .transpose()
    }

    async fn load_all(&self) -> Result<Vec<SilenceRecord>> {
        self.read_document()
            .await?
            .into_iter()
            .map(|(channel_id, entry)| entry.into_record(channel_id))
            .collect()
    }

    async fn save(&self, record: &SilenceRecord) -> Result<()> {
        let mut document = self.read_document().await?;
        document.insert(record.channel_id.clone(), StoredEntry::from_record(record));
        self.write_document(&document).await
    }

    async fn delete(&self, channel_id: &str) -> Result<bool> {
        let mut document = self.read_document().await?;
        if document.remove(channel_id).is_none() {
            return Ok(false);
        }
        self.write_document(&document).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::TempDir;

    use super::*;

    fn record(channel_id: &str, expires_at: Option<DateTime<Utc>>) -> SilenceRecord {
        SilenceRecord {
            channel_id: channel_id.into(),
            expires_at,
            disabled: DisabledCapabilities::new(["reply"], ["help"]),
        }
    }

    #[tokio::test]
    async fn test_creates_missing_file() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("nested").join("silence.json");
        let backend = JsonFileBackend::open(&path).await?;

        assert!(path.exists());
        assert!(backend.load_all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_survives_reopen() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("silence.json");
        // Whole microseconds so the f64 round trip is exact.
        let at = DateTime::from_timestamp_micros(1_760_000_000_123_456).unwrap();

        let backend = JsonFileBackend::open(&path).await?;
        backend.save(&record("a", Some(at))).await?;
        backend.save(&record("b", None)).await?;
        drop(backend);

        let backend = JsonFileBackend::open(&path).await?;
        assert_eq!(backend.load("a").await?, Some(record("a", Some(at))));
        assert_eq!(backend.load("b").await?, Some(record("b", None)));
        assert_eq!(backend.load_all().await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let backend = JsonFileBackend::open(tmp.path().join("silence.json")).await?;
        backend.save(&record("a", None)).await?;

        assert!(backend.delete("a").await?);
        assert!(!backend.delete("a").await?);
        assert_eq!(backend.load("a").await?, None);
        assert!(tmp.path().join("silence.json.bak").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_legacy_layout() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("silence.json");
        let expiry = Utc::now() + Duration::hours(1);
        let legacy = format!(
            r#"{{
                "legacy": {{"expiration": {}, "disabled_actions": ["reply"]}},
                "forever": {{"expiration": null}}
            }}"#,
            expiry.timestamp()
        );
        fs::write(&path, legacy).await?;

        let backend = JsonFileBackend::open(&path).await?;
        let legacy = backend.load("legacy").await?.unwrap();
        assert_eq!(legacy.expires_at.map(|t| t.timestamp()), Some(expiry.timestamp()));
        assert!(legacy.disabled.actions.contains("reply"));
        assert!(legacy.disabled.commands.is_empty());
        assert_eq!(backend.load("forever").await?.unwrap().expires_at, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_writes_legacy_key() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("silence.json");
        let at = DateTime::from_timestamp(1_760_000_000, 0).unwrap();
        let backend = JsonFileBackend::open(&path).await?;
        backend.save(&record("a", Some(at))).await?;
        backend.save(&record("b", None)).await?;

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).await?)?;
        assert_eq!(written["a"]["expiration"], serde_json::json!(1_760_000_000.0));
        assert!(written["b"]["expiration"].is_null());
        assert!(written["a"].get("expires_at").is_none());
        assert_eq!(written["a"]["disabled_actions"], serde_json::json!(["reply"]));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_backup_still_writes() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("silence.json");
        // a directory where the backup file should go makes the copy fail
        fs::create_dir(tmp.path().join("silence.json.bak")).await?;

        let backend = JsonFileBackend::open(&path).await?;
        backend.save(&record("a", None)).await?;
        backend.save(&record("b", None)).await?;
        assert_eq!(backend.load_all().await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("silence.json");
        fs::write(&path, "{ not json").await?;

        let backend = JsonFileBackend::open(&path).await?;
        assert!(matches!(backend.load("a").await, Err(Error::Json(_))));
        assert!(matches!(backend.save(&record("a", None)).await, Err(Error::Json(_))));
        assert_eq!(fs::read_to_string(&path).await?, "{ not json");
        Ok(())
    }
}
