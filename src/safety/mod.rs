//! Safety layer — scrubs IPv4 addresses out of text before it is
//! logged or shown outside the process.

pub mod anonymize;
pub mod ip_pattern;
