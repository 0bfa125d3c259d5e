//! Utility functions

use chrono::DateTime;
use serde::Serialize;

/// `Tue, 15 Nov 1994 08:12:31 GMT`
pub const RFC1123_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Version information for the client
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("CASPER_GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("CASPER_BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Format a UNIX timestamp (seconds, UTC) as an RFC 1123 date
pub fn format_timestamp(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|date| date.format(RFC1123_DATE_FORMAT).to_string())
}
