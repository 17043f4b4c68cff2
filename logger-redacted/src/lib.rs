//! Logging for ClaimTrack with PHI redaction
//!
//! [`init`] installs the global `tracing` subscriber (an `EnvFilter` plus either a
//! human-readable or a JSON fmt layer writing to stderr). Messages that may echo
//! source rows go through [`redact`], usually via the [`redacted_warn!`] family of
//! macros, so SSNs, phone numbers, e-mail addresses and MRNs never reach log files.
//!
//! ```rust
//! use logger_redacted::{redact, PiiRedactor, RedactionConfig};
//!
//! let redactor = PiiRedactor::new(RedactionConfig {
//!     hash_for_correlation: false,
//!     ..Default::default()
//! });
//! assert_eq!(redactor.redact("SSN 123-45-6789"), "SSN ***-**-****");
//! assert!(!redact("SSN 123-45-6789").contains("6789"));
//! ```

pub mod config;
pub mod error;
pub mod macros;
pub mod redactor;

pub use config::*;
pub use error::*;
pub use redactor::*;

use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

lazy_static! {
    static ref DEFAULT_REDACTOR: PiiRedactor = PiiRedactor::default();
}

static REDACTION_ENABLED: AtomicBool = AtomicBool::new(true);

/// Redact a message with the process-wide redactor
pub fn redact(text: &str) -> String {
    if REDACTION_ENABLED.load(Ordering::Relaxed) {
        DEFAULT_REDACTOR.redact(text)
    } else {
        text.to_string()
    }
}

pub fn set_redaction_enabled(enabled: bool) {
    REDACTION_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `config.level` when set.
///
/// # Errors
///
/// Fails when the filter directive is invalid or a subscriber is already installed.
pub fn init(config: &LoggerConfig) -> LoggerResult<()> {
    set_redaction_enabled(config.redaction_enabled);

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init()?,
    }

    tracing::debug!(format = ?config.format, level = %config.level, "Logging initialised");
    Ok(())
}
