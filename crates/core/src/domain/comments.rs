use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_TIME: &str = "unknown";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One harvested comment. Field names double as CSV headers and JSON keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub user: String,
    pub comment: String,
    pub time: String,
    pub likes: u64,
    pub reply_count: u64,
}

/// Formats a unix timestamp (seconds) as UTC, or [`UNKNOWN_TIME`] when absent or out of range.
pub fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN_TIME.to_string())
}
