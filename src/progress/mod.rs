//! Progress events published while a batch of companies is analyzed.
//!
//! The batch driver and the stage controller both report through a shared
//! [`ProgressHandler`]; the CLI installs a [`LoggingHandler`], library
//! callers get a [`NoOpHandler`] unless they attach their own.

mod handler;
mod logging;

pub use handler::{NoOpHandler, ProgressEvent, ProgressHandler};
pub use logging::LoggingHandler;
