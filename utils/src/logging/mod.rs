mod tracing;

pub use self::tracing::{filter, start_tracing, LOG_ENV};
