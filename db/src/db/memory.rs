use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::db::{Backend, SilenceRecord};
use crate::Result;

/// Non-persistent backend, state lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, SilenceRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn load(&self, channel_id: &str) -> Result<Option<SilenceRecord>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(channel_id).cloned())
    }

    async fn load_all(&self) -> Result<Vec<SilenceRecord>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.values().cloned().collect())
    }

    async fn save(&self, record: &SilenceRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.insert(record.channel_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, channel_id: &str) -> Result<bool> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.remove(channel_id).is_some())
    }
}
