use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{Lookup, Result, SilenceStore};

/// Why [`SilenceStore::wait_for_release`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    /// The silence ran out.
    Expired,
    /// The record was removed before it ran out (or there was none).
    Lifted,
    Cancelled,
}

const HEARTBEAT_SECS: u64 = 60;
/// `interval` rejects a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

impl SilenceStore {
    /// Polls the channel every `poll_interval` until it is no longer silenced
    /// or `cancel` fires.
    pub async fn wait_for_release(
        &self,
        channel_id: &str,
        poll_interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<Released> {
        let started = Instant::now();
        let mut ticker = interval(poll_interval.max(MIN_PERIOD));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut deadline = None;
        let mut heartbeats = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(target: "SilenceWatch", "Stopped waiting on {channel_id}");
                    return Ok(Released::Cancelled);
                }
                _ = ticker.tick() => {}
            }

            let lookup = {
                let _guard = self.lock.lock().await;
                self.lookup(channel_id).await?
            };
            match lookup {
                Lookup::Live(record) => deadline = record.expires_at,
                Lookup::Expired(_) => return Ok(Released::Expired),
                Lookup::Absent => {
                    // Someone else may have cleaned it up after it ran out.
                    let expired = matches!(deadline, Some(at) if at <= self.now());
                    return Ok(if expired {
                        Released::Expired
                    } else {
                        Released::Lifted
                    });
                }
            }

            let elapsed = started.elapsed().as_secs();
            if elapsed / HEARTBEAT_SECS > heartbeats {
                heartbeats = elapsed / HEARTBEAT_SECS;
                debug!(target: "SilenceWatch", "{channel_id} silenced for {elapsed}s, still waiting");
            }
        }
    }

    /// Runs [`sweep_expired`](Self::sweep_expired) every `every` until `cancel` fires.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let every = every.max(MIN_PERIOD);
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(target: "SilenceSweeper", "Sweeping expired silences every {every:?}");
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        match store.sweep_expired().await {
                            Ok(0) => {}
                            Ok(count) => debug!(target: "SilenceSweeper", "Cleaned {count} channels"),
                            Err(e) => error!(target: "SilenceSweeper", "Error sweeping expired silences, {e}"),
                        }
                    }
                }
            }
            info!(target: "SilenceSweeper", "Sweeper stopped");
        })
    }
}
