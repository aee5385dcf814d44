//! Logging setup for the k6 runner.
//!
//! One call to [`init_logger`] installs a global `tracing` subscriber: text, JSON or journald
//! output, an `EnvFilter` level expression and RFC 3339 timestamps in UTC or local time.
mod config;
pub use config::LoggerConfig;

mod error;
pub use error::{LoggerError, LoggerResult};

mod format;
pub use format::LoggerFormat;

mod level;
pub use level::LoggerLevel;

mod timer;
pub use timer::{LoggerTimeZone, LoggerTimer, init_local_offset};

mod install;

/// Install the global tracing subscriber described by `cfg`.
///
/// For [`LoggerTimeZone::Local`], call [`init_local_offset`] before any thread is spawned.
///
/// # Examples
/// ```rust
/// use k6r_observe::{LoggerConfig, init_logger};
///
/// let config = LoggerConfig::default();
/// init_logger(&config).expect("Failed to initialize logger");
/// tracing::info!("logger ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => install::text(cfg),
        LoggerFormat::Json => install::json(cfg),
        LoggerFormat::Journald => install::journald(cfg),
    }
}
