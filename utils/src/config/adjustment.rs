use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentConfig {
    /// Also disable commands while silenced, read when the next silence starts.
    pub disable_command: bool,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            disable_command: true,
        }
    }
}

impl fmt::Display for AdjustmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Disable Commands: {}", self.disable_command)
    }
}
