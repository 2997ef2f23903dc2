pub mod clock;
pub mod db;
pub mod error;
pub mod gate;
pub mod watch;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub use clock::{Clock, ManualClock, SystemClock};
pub use db::{Backend, DisabledCapabilities, JsonFileBackend, MemoryBackend, SilenceRecord};
#[cfg(feature = "sqlite")]
pub use db::SqliteBackend;
pub use error::{Error, Result};
pub use gate::{CapabilityKind, ComponentGate, LoggingGate, RELEASE_ACTION};
pub use tokio_util::sync::CancellationToken;
pub use watch::Released;

/// How much longer a channel stays silenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Indefinite,
    For(StdDuration),
}

/// Result of looking a channel up under the store lock.
enum Lookup {
    Absent,
    Live(SilenceRecord),
    /// The record had expired and has just been cleaned up.
    Expired(SilenceRecord),
}

/// Persisted per-channel silence state.
///
/// Every operation runs under one store-wide lock, including the gate calls
/// of the transition it triggers, so the order of transitions seen by the
/// host matches the order they were committed in.
pub struct SilenceStore {
    backend: Arc<dyn Backend>,
    gate: Arc<dyn ComponentGate>,
    clock: Arc<dyn Clock>,
    release_action: String,
    lock: Mutex<()>,
}

impl SilenceStore {
    pub fn new(backend: Arc<dyn Backend>, gate: Arc<dyn ComponentGate>) -> Self {
        Self {
            backend,
            gate,
            clock: Arc::new(SystemClock),
            release_action: RELEASE_ACTION.to_string(),
            lock: Mutex::new(()),
        }
    }

    pub fn new_memory(gate: Arc<dyn ComponentGate>) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), gate)
    }

    pub async fn open_json(path: impl AsRef<Path>, gate: Arc<dyn ComponentGate>) -> Result<Self> {
        let backend = JsonFileBackend::open(path.as_ref()).await?;
        Ok(Self::new(Arc::new(backend), gate))
    }

    #[cfg(feature = "sqlite")]
    pub async fn open_sqlite(path: impl AsRef<Path>, gate: Arc<dyn ComponentGate>) -> Result<Self> {
        let backend = SqliteBackend::open(path.as_ref()).await?;
        Ok(Self::new(Arc::new(backend), gate))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Overrides the action enabled while a channel is silenced.
    pub fn with_release_capability(mut self, name: impl Into<String>) -> Self {
        self.release_action = name.into();
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Whether `channel_id` is silenced right now. An expired record is
    /// cleaned up, capabilities restored, before this returns `false`.
    pub async fn is_silenced(&self, channel_id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        Ok(matches!(self.lookup(channel_id).await?, Lookup::Live(_)))
    }

    /// The live record for `channel_id`, with the same expiry handling as
    /// [`is_silenced`](Self::is_silenced).
    pub async fn record(&self, channel_id: &str) -> Result<Option<SilenceRecord>> {
        let _guard = self.lock.lock().await;
        match self.lookup(channel_id).await? {
            Lookup::Live(record) => Ok(Some(record)),
            Lookup::Absent | Lookup::Expired(_) => Ok(None),
        }
    }

    pub async fn remaining(&self, channel_id: &str) -> Result<Option<Remaining>> {
        let Some(record) = self.record(channel_id).await? else {
            return Ok(None);
        };
        Ok(Some(match record.expires_at {
            None => Remaining::Indefinite,
            Some(at) => Remaining::For((at - self.clock.now()).to_std().unwrap_or_default()),
        }))
    }

    /// Silences `channel_id`, disabling the given capabilities for it.
    ///
    /// Returns `false` without touching anything if the channel is already
    /// silenced. `None` or a zero duration silences until [`remove`](Self::remove).
    pub async fn add<A, C>(
        &self,
        channel_id: &str,
        duration: Option<StdDuration>,
        disabled_actions: A,
        disabled_commands: C,
    ) -> Result<bool>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let _guard = self.lock.lock().await;
        if let Lookup::Live(_) = self.lookup(channel_id).await? {
            warn!(target: "SilenceStore", "Channel {channel_id} is already silenced");
            return Ok(false);
        }

        let now = self.clock.now();
        let expires_at = match duration.filter(|d| !d.is_zero()) {
            Some(d) => Some(
                Duration::from_std(d)
                    .ok()
                    .and_then(|d| now.checked_add_signed(d))
                    .ok_or_else(|| Error::message(format!("Silence duration too long, {d:?}")))?,
            ),
            None => None,
        };
        let record = SilenceRecord {
            channel_id: channel_id.to_string(),
            expires_at,
            disabled: DisabledCapabilities::new(disabled_actions, disabled_commands),
        };

        self.backend.save(&record).await?;
        gate::silence(self.gate.as_ref(), channel_id, &record.disabled, &self.release_action).await;

        match expires_at {
            Some(at) => info!(target: "SilenceStore", "Silenced {channel_id} until {at}"),
            None => info!(target: "SilenceStore", "Silenced {channel_id} indefinitely"),
        }
        Ok(true)
    }

    /// Lifts the silence on `channel_id`, restoring exactly what was disabled.
    ///
    /// Returns `false` if the channel was not silenced; an expired record is
    /// cleaned up on the way.
    pub async fn remove(&self, channel_id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        match self.lookup(channel_id).await? {
            Lookup::Live(record) => {
                self.release(&record).await?;
                info!(target: "SilenceStore", "Lifted silence on {channel_id}");
                Ok(true)
            }
            Lookup::Absent | Lookup::Expired(_) => {
                warn!(target: "SilenceStore", "Channel {channel_id} is not silenced");
                Ok(false)
            }
        }
    }

    /// Every persisted record and its expiry, expired ones included.
    pub async fn list_all(&self) -> Result<BTreeMap<String, Option<DateTime<Utc>>>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .backend
            .load_all()
            .await?
            .into_iter()
            .map(|record| (record.channel_id, record.expires_at))
            .collect())
    }

    /// Cleans up every expired record and returns how many there were. A
    /// record that fails to clean up does not stop the others; the first
    /// failure is returned once the pass is done.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let now = self.clock.now();
        let mut count = 0;
        let mut first_err = None;
        for record in self.backend.load_all().await? {
            if !record.is_expired(now) {
                continue;
            }
            match self.release(&record).await {
                Ok(()) => count += 1,
                Err(e) => {
                    error!(target: "SilenceStore", "Error sweeping {}, {e}", record.channel_id);
                    first_err.get_or_insert(e);
                }
            }
        }
        if count > 0 {
            info!(target: "SilenceStore", "Swept {count} expired silences");
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    /// Must be called with the lock held.
    async fn lookup(&self, channel_id: &str) -> Result<Lookup> {
        let Some(record) = self.backend.load(channel_id).await? else {
            return Ok(Lookup::Absent);
        };
        if !record.is_expired(self.clock.now()) {
            return Ok(Lookup::Live(record));
        }
        self.release(&record).await?;
        debug!(target: "SilenceStore", "Silence on {channel_id} expired");
        Ok(Lookup::Expired(record))
    }

    /// Restores the recorded capabilities, then deletes the record. Must be
    /// called with the lock held.
    async fn release(&self, record: &SilenceRecord) -> Result<()> {
        gate::restore(
            self.gate.as_ref(),
            &record.channel_id,
            &record.disabled,
            &self.release_action,
        )
        .await;
        self.backend.delete(&record.channel_id).await?;
        Ok(())
    }
}
