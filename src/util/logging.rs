//! Tracing setup for the CLI
//!
//! Logs go to stderr so stdout stays clean for report paths and batch
//! summaries. An explicit `RUST_LOG` takes over filtering wholesale;
//! otherwise the configured level applies to this crate and the noisy
//! HTTP internals (h2, hyper, reqwest) are damped to `warn`.

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// How verbose the process should be and in which format.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level applied to this crate's spans and events
    pub level: Level,
    /// Emit JSON lines (with file/line metadata) instead of the
    /// human-readable console format
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Reads `DEALSCOPE_LOG_LEVEL` and `DEALSCOPE_LOG_JSON`, falling
    /// back to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let level = env::var("DEALSCOPE_LOG_LEVEL")
            .map(|raw| parse_level(&raw))
            .unwrap_or(Level::INFO);

        let json = env::var("DEALSCOPE_LOG_JSON")
            .ok()
            .and_then(|raw| raw.parse::<bool>().ok())
            .unwrap_or(false);

        Self { level, json }
    }
}

/// Parses a log level name, case-insensitively
///
/// Unknown names fall back to `Level::INFO` with a note on stderr
/// rather than failing startup.
///
/// # Example
///
/// ```
/// use dealscope::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("chatty"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    level_str.parse().unwrap_or_else(|_| {
        eprintln!(
            "unrecognized log level '{}', using info (expected trace, debug, info, warn, or error)",
            level_str
        );
        Level::INFO
    })
}

/// Installs the global tracing subscriber. Idempotent; calls after the
/// first are no-ops, so tests may call it freely.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            filter = filter
                .add_directive(format!("dealscope={}", config.level).parse().unwrap())
                .add_directive("h2=warn".parse().unwrap())
                .add_directive("hyper=warn".parse().unwrap())
                .add_directive("reqwest=warn".parse().unwrap());
        }

        let console = fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr);

        if config.json {
            tracing_subscriber::registry()
                .with(filter)
                .with(console.json().with_file(true).with_line_number(true))
                .init();
        } else {
            tracing_subscriber::registry().with(filter).with(console).init();
        }
    });
}

/// Installs the subscriber configured purely from the environment.
pub fn init_from_env() {
    init_logging(LoggingConfig::from_env());
}
