use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use feeltrack_core::domain::comments::{format_timestamp, CommentRecord};

/// Comments requested per page; also the cursor step when the service omits one.
pub const PAGE_SIZE: u64 = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    pub comments: Vec<CommentRecord>,
    pub has_more: bool,
    pub next_cursor: u64,
    pub skipped: usize,
}

/// Parses one comment-listing payload. Returns `None` when the page carries no comments.
pub fn parse_page(payload: &Value, cursor: u64) -> Option<ParsedPage> {
    let entries = payload
        .get("comments")
        .and_then(Value::as_array)
        .filter(|entries| !entries.is_empty())?;

    let mut comments = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for (index, entry) in entries.iter().enumerate() {
        match parse_entry(entry) {
            Ok(record) => comments.push(record),
            Err(err) => {
                skipped += 1;
                warn!(cursor, index, error = %err, "skipping malformed comment");
            }
        }
    }

    Some(ParsedPage {
        comments,
        has_more: read_has_more(payload),
        next_cursor: next_cursor(payload, cursor, entries.len()),
        skipped,
    })
}

fn parse_entry(entry: &Value) -> Result<CommentRecord, PageError> {
    let user = entry
        .get("user")
        .and_then(|user| user.get("nickname"))
        .and_then(Value::as_str)
        .ok_or(PageError::MissingField("user.nickname"))?;
    let text = entry
        .get("text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .or_else(|| {
            entry
                .get("share_info")
                .and_then(|info| info.get("desc"))
                .and_then(Value::as_str)
        })
        .unwrap_or_default();
    let time = format_timestamp(entry.get("create_time").and_then(Value::as_i64));

    Ok(CommentRecord {
        user: user.to_string(),
        comment: text.to_string(),
        time,
        likes: read_count(entry, "digg_count"),
        reply_count: read_count(entry, "reply_comment_total"),
    })
}

fn read_count(entry: &Value, key: &str) -> u64 {
    entry.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn read_has_more(payload: &Value) -> bool {
    match payload.get("has_more") {
        Some(Value::Bool(value)) => *value,
        Some(value) => value.as_i64() == Some(1),
        None => false,
    }
}

fn next_cursor(payload: &Value, cursor: u64, entries: usize) -> u64 {
    let reported = payload
        .get("cursor")
        .and_then(Value::as_u64)
        .unwrap_or(cursor + PAGE_SIZE);
    if reported > cursor {
        reported
    } else {
        cursor + (entries as u64).max(1)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_entry, parse_page, PageError};

    fn entry(nickname: &str, text: &str) -> serde_json::Value {
        json!({
            "user": {"nickname": nickname},
            "text": text,
            "create_time": 1_728_000_000,
            "digg_count": 5,
            "reply_comment_total": 2
        })
    }

    #[test]
    fn parses_all_fields() {
        let payload = json!({"comments": [entry("ana", "me encanta")], "has_more": 1, "cursor": 20});
        let page = parse_page(&payload, 0).unwrap();
        assert_eq!(page.comments.len(), 1);
        let record = &page.comments[0];
        assert_eq!(record.user, "ana");
        assert_eq!(record.comment, "me encanta");
        assert_eq!(record.time, "2024-10-04 00:00:00");
        assert_eq!(record.likes, 5);
        assert_eq!(record.reply_count, 2);
        assert!(page.has_more);
        assert_eq!(page.next_cursor, 20);
    }

    #[test]
    fn malformed_entry_is_skipped_alone() {
        let payload = json!({
            "comments": [
                entry("ana", "uno"),
                {"text": "sin usuario", "digg_count": 1},
                entry("luis", "tres")
            ],
            "has_more": 0
        });
        let page = parse_page(&payload, 0).unwrap();
        let users: Vec<&str> = page.comments.iter().map(|c| c.user.as_str()).collect();
        assert_eq!(users, vec!["ana", "luis"]);
        assert_eq!(page.comments[1].comment, "tres");
        assert_eq!(page.skipped, 1);
        assert!(!page.has_more);
    }

    #[test]
    fn missing_nickname_reports_field() {
        let err = parse_entry(&json!({"user": {}, "text": "x"})).unwrap_err();
        assert_eq!(err, PageError::MissingField("user.nickname"));
    }

    #[test]
    fn empty_text_falls_back_to_share_desc() {
        let record = parse_entry(&json!({
            "user": {"nickname": "eva"},
            "text": "",
            "share_info": {"desc": "compartido"}
        }))
        .unwrap();
        assert_eq!(record.comment, "compartido");
        assert_eq!(record.likes, 0);
        assert_eq!(record.reply_count, 0);
        assert_eq!(record.time, "unknown");
    }

    #[test]
    fn no_comments_means_no_data() {
        assert!(parse_page(&json!({"comments": [], "has_more": 1}), 0).is_none());
        assert!(parse_page(&json!({"comments": null}), 0).is_none());
        assert!(parse_page(&json!({"status_code": 0}), 0).is_none());
    }

    #[test]
    fn cursor_defaults_to_page_step() {
        let payload = json!({"comments": [entry("ana", "x")], "has_more": 1});
        assert_eq!(parse_page(&payload, 40).unwrap().next_cursor, 60);
    }

    #[test]
    fn stalled_cursor_is_advanced_by_entry_count() {
        let payload = json!({"comments": [entry("a", "x"), entry("b", "y")], "has_more": 1, "cursor": 40});
        assert_eq!(parse_page(&payload, 40).unwrap().next_cursor, 42);
    }

    #[test]
    fn has_more_accepts_bool() {
        let payload = json!({"comments": [entry("a", "x")], "has_more": true, "cursor": 1});
        assert!(parse_page(&payload, 0).unwrap().has_more);
    }
}
