use core::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::DisabledCapabilities;

/// Action that lets a silenced channel break its silence early.
pub const RELEASE_ACTION: &str = "silence_stop_action";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Action,
    Command,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action => write!(f, "action"),
            Self::Command => write!(f, "command"),
        }
    }
}

/// Host-side switch for per-channel capabilities.
///
/// A capability toggled for one channel must not affect any other channel.
/// Errors are reported back but the store only logs them.
#[async_trait]
pub trait ComponentGate: Send + Sync {
    async fn enable(&self, name: &str, kind: CapabilityKind, channel_id: &str)
        -> anyhow::Result<()>;

    async fn disable(
        &self,
        name: &str,
        kind: CapabilityKind,
        channel_id: &str,
    ) -> anyhow::Result<()>;
}

/// Gate for hosts without a component registry, it only logs the toggles.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingGate;

#[async_trait]
impl ComponentGate for LoggingGate {
    async fn enable(
        &self,
        name: &str,
        kind: CapabilityKind,
        channel_id: &str,
    ) -> anyhow::Result<()> {
        info!(target: "ComponentGate", "Enabled {kind} {name} in {channel_id}");
        Ok(())
    }

    async fn disable(
        &self,
        name: &str,
        kind: CapabilityKind,
        channel_id: &str,
    ) -> anyhow::Result<()> {
        info!(target: "ComponentGate", "Disabled {kind} {name} in {channel_id}");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    Enable,
    Disable,
}

impl Toggle {
    fn flip(self) -> Self {
        match self {
            Self::Enable => Self::Disable,
            Self::Disable => Self::Enable,
        }
    }
}

async fn toggle(
    gate: &dyn ComponentGate,
    toggle: Toggle,
    name: &str,
    kind: CapabilityKind,
    channel_id: &str,
) {
    let res = match toggle {
        Toggle::Enable => gate.enable(name, kind, channel_id).await,
        Toggle::Disable => gate.disable(name, kind, channel_id).await,
    };
    if let Err(e) = res {
        warn!(
            target: "ComponentGate",
            "Error toggling ({:?}) {kind} {name} in {channel_id}, {e}", toggle
        );
    }
}

/// Applies one transition: every recorded action, then every recorded command,
/// then the release action with the opposite toggle.
async fn transition(
    gate: &dyn ComponentGate,
    channel_id: &str,
    disabled: &DisabledCapabilities,
    release: &str,
    recorded: Toggle,
) {
    for name in &disabled.actions {
        toggle(gate, recorded, name, CapabilityKind::Action, channel_id).await;
    }
    for name in &disabled.commands {
        toggle(gate, recorded, name, CapabilityKind::Command, channel_id).await;
    }
    toggle(gate, recorded.flip(), release, CapabilityKind::Action, channel_id).await;
}

pub(crate) async fn silence(
    gate: &dyn ComponentGate,
    channel_id: &str,
    disabled: &DisabledCapabilities,
    release: &str,
) {
    transition(gate, channel_id, disabled, release, Toggle::Disable).await;
    info!(
        target: "ComponentGate",
        "Disabled {} actions and {} commands in {channel_id}",
        disabled.actions.len(),
        disabled.commands.len()
    );
}

pub(crate) async fn restore(
    gate: &dyn ComponentGate,
    channel_id: &str,
    disabled: &DisabledCapabilities,
    release: &str,
) {
    transition(gate, channel_id, disabled, release, Toggle::Enable).await;
    info!(
        target: "ComponentGate",
        "Restored {} actions and {} commands in {channel_id}",
        disabled.actions.len(),
        disabled.commands.len()
    );
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use anyhow::bail;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum GateCall {
        Enable(String, CapabilityKind),
        Disable(String, CapabilityKind),
    }

    pub fn enable(name: &str, kind: CapabilityKind) -> GateCall {
        GateCall::Enable(name.to_string(), kind)
    }

    pub fn disable(name: &str, kind: CapabilityKind) -> GateCall {
        GateCall::Disable(name.to_string(), kind)
    }

    /// Records every call per channel, optionally failing on one capability name.
    #[derive(Debug, Default)]
    pub struct RecordingGate {
        calls: Mutex<Vec<(String, GateCall)>>,
        fail_on: Option<String>,
    }

    impl RecordingGate {
        pub fn failing_on(name: &str) -> Self {
            Self {
                fail_on: Some(name.to_string()),
                ..Default::default()
            }
        }

        pub fn calls(&self, channel_id: &str) -> Vec<GateCall> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _)| c == channel_id)
                .map(|(_, call)| call.clone())
                .collect()
        }

        pub fn total(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn record(&self, channel_id: &str, call: GateCall) -> anyhow::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((channel_id.to_string(), call.clone()));
            let name = match &call {
                GateCall::Enable(name, _) | GateCall::Disable(name, _) => name,
            };
            if self.fail_on.as_deref() == Some(name.as_str()) {
                bail!("host refused to toggle {name}");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ComponentGate for RecordingGate {
        async fn enable(
            &self,
            name: &str,
            kind: CapabilityKind,
            channel_id: &str,
        ) -> anyhow::Result<()> {
            self.record(channel_id, GateCall::Enable(name.to_string(), kind))
        }

        async fn disable(
            &self,
            name: &str,
            kind: CapabilityKind,
            channel_id: &str,
        ) -> anyhow::Result<()> {
            self.record(channel_id, GateCall::Disable(name.to_string(), kind))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn caps() -> DisabledCapabilities {
        DisabledCapabilities::new(["reply", "emoji"], ["help"])
    }

    #[tokio::test]
    async fn test_silence_order() {
        let gate = RecordingGate::default();
        silence(&gate, "chan", &caps(), RELEASE_ACTION).await;

        assert_eq!(
            gate.calls("chan"),
            vec![
                disable("emoji", CapabilityKind::Action),
                disable("reply", CapabilityKind::Action),
                disable("help", CapabilityKind::Command),
                enable(RELEASE_ACTION, CapabilityKind::Action),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_transition() {
        let gate = RecordingGate::failing_on("emoji");
        restore(&gate, "chan", &caps(), RELEASE_ACTION).await;

        assert_eq!(gate.calls("chan").len(), 4);
        assert_eq!(
            gate.calls("chan").last(),
            Some(&disable(RELEASE_ACTION, CapabilityKind::Action))
        );
    }
}
