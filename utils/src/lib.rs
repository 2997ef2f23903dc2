pub mod config;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "policy")]
pub mod policy;

#[cfg(feature = "db")]
pub use hush_db;
