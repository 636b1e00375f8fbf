pub mod commands;
pub mod handlers;

pub use commands::{AnalyzeArgs, CliArgs, Commands, HealthArgs};
pub use handlers::{handle_analyze, handle_health};
