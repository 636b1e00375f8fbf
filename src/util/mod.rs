//! Shared plumbing with no domain logic of its own.

pub mod logging;

pub use logging::{init_from_env, init_logging, LoggingConfig};
