use core::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceConfig {
    /// How often a release watcher re-checks its channel.
    pub poll_interval_ms: u64,
    /// Eager expiry sweep, off when absent or zero.
    pub sweep_interval_secs: Option<u64>,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            sweep_interval_secs: None,
        }
    }
}

impl SilenceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl fmt::Display for SilenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Poll Interval: {}ms", self.poll_interval_ms)?;
        match self.sweep_interval_secs {
            Some(secs) if secs > 0 => writeln!(f, "Sweep Interval: {secs}s"),
            _ => writeln!(f, "Sweep Interval: disabled"),
        }
    }
}
