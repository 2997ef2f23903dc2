//! Helpers for the layer that decides when to call the silence store.
//! The store itself never uses them.

pub mod capabilities;
pub mod command;
pub mod duration;

pub use capabilities::{capabilities_to_disable, SILENCE_COMMAND};
pub use command::SilenceCommand;
pub use duration::{duration_for, SilenceCase};

use tracing::warn;

use crate::config::PermissionsConfig;

/// Whether `user_id` may silence or release a channel by command.
pub fn is_admin(user_id: &str, permissions: &PermissionsConfig) -> bool {
    if permissions.admin_users.is_empty() {
        warn!(target: "Permissions", "No admin users configured");
        return false;
    }
    permissions.admin_users.iter().any(|admin| admin == user_id)
}
