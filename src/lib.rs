//! ip-scrub — replaces real IPv4 addresses in log lines and diagnostic
//! text with stable per-call placeholders (`ip1`, `ip2`, ...).
//!
//! - IP pattern provider (safety/ip_pattern.rs)
//! - Batch anonymizer (safety/anonymize.rs)
//! - Configuration (config.rs)

pub mod config;
pub mod safety;

pub use config::{AnonymizerConfig, ConfigError};
pub use safety::anonymize::{
    anonymize_ips, AnonymizeError, AnonymizeReport, IpAnonymizer, LabelMapping, ReplaceMode,
};
pub use safety::ip_pattern::IP_REGEX;

/// Initialize `env_logger` from `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::info!("ip-scrub logging initialized");
    }
}
