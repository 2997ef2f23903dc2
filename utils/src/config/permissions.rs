use core::fmt;

use serde::{Deserialize, Serialize};

/// Users allowed to silence or release a channel by command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    pub admin_users: Vec<String>,
}

impl fmt::Display for PermissionsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Admin Users: {:?}", self.admin_users)
    }
}
