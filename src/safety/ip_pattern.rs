//! Canonical IPv4-literal pattern.
//!
//! Four dot-separated groups of 1-3 ASCII digits. Octet ranges are not
//! checked, so `999.1.1.1` matches as well.

use regex::Regex;
use std::sync::LazyLock;

pub const IP_REGEX: &str = r"[0-9]{1,3}(?:\.[0-9]{1,3}){3}";

pub(crate) static IP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(IP_REGEX).expect("IP_REGEX is a valid pattern"));
