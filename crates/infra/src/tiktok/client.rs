use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, COOKIE, USER_AGENT};
use serde_json::Value;
use thiserror::Error;

use crate::tiktok::page::PAGE_SIZE;

const APP_ID: &str = "1988";
const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub const DEFAULT_USER_AGENTS: [&str; 3] = [
    FALLBACK_USER_AGENT,
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3.1 Mobile/15E148 Safari/604.1",
];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error {status_code}: {message}")]
    Api { status_code: i64, message: String },
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

/// A paginated comment listing. One call is one request; retries are the caller's concern.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn request_page(&self, post_id: &str, cursor: u64) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone)]
pub struct TiktokClientConfig {
    pub endpoint: String,
    pub ms_token: String,
    pub x_bogus: String,
    pub web_id: String,
    pub user_agents: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TiktokCommentClient {
    http: reqwest::Client,
    config: TiktokClientConfig,
}

impl TiktokCommentClient {
    pub fn new(http: reqwest::Client, config: TiktokClientConfig) -> Self {
        Self { http, config }
    }

    fn pick_user_agent(&self) -> &str {
        self.config
            .user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(FALLBACK_USER_AGENT)
    }
}

#[async_trait]
impl CommentSource for TiktokCommentClient {
    async fn request_page(&self, post_id: &str, cursor: u64) -> Result<Value, FetchError> {
        let response = self
            .http
            .get(&self.config.endpoint)
            .header(ACCEPT, "*/*")
            .header(USER_AGENT, self.pick_user_agent())
            .header(COOKIE, session_cookie(&self.config))
            .query(&page_query(&self.config, post_id, cursor))
            .send()
            .await?
            .error_for_status()?;
        let payload: Value = response.json().await?;
        check_api_status(&payload)?;
        Ok(payload)
    }
}

fn page_query(config: &TiktokClientConfig, post_id: &str, cursor: u64) -> Vec<(&'static str, String)> {
    vec![
        ("aid", APP_ID.to_string()),
        ("aweme_id", post_id.to_string()),
        ("cursor", cursor.to_string()),
        ("count", PAGE_SIZE.to_string()),
        ("web_id", config.web_id.clone()),
        ("msToken", config.ms_token.clone()),
        ("X-Bogus", config.x_bogus.clone()),
    ]
}

fn session_cookie(config: &TiktokClientConfig) -> String {
    format!("tt_webid_v2={}; msToken={}", config.web_id, config.ms_token)
}

fn check_api_status(payload: &Value) -> Result<(), FetchError> {
    let status_code = payload.get("status_code").and_then(Value::as_i64).unwrap_or(0);
    if status_code == 0 {
        return Ok(());
    }
    let message = payload
        .get("status_msg")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Err(FetchError::Api {
        status_code,
        message,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        check_api_status, page_query, session_cookie, FetchError, TiktokClientConfig,
        TiktokCommentClient, DEFAULT_USER_AGENTS, FALLBACK_USER_AGENT,
    };

    fn config() -> TiktokClientConfig {
        TiktokClientConfig {
            endpoint: "https://example.test/api/comment/list/".to_string(),
            ms_token: "ms".to_string(),
            x_bogus: "bogus".to_string(),
            web_id: "777".to_string(),
            user_agents: vec![],
        }
    }

    #[test]
    fn page_query_carries_pagination() {
        let query = page_query(&config(), "123", 40);
        assert!(query.contains(&("aweme_id", "123".to_string())));
        assert!(query.contains(&("cursor", "40".to_string())));
        assert!(query.contains(&("count", "20".to_string())));
        assert!(query.contains(&("aid", "1988".to_string())));
        assert!(query.contains(&("X-Bogus", "bogus".to_string())));
    }

    #[test]
    fn session_cookie_format() {
        assert_eq!(session_cookie(&config()), "tt_webid_v2=777; msToken=ms");
    }

    #[test]
    fn user_agent_comes_from_pool() {
        let pool: Vec<String> = DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect();
        let client = TiktokCommentClient::new(
            reqwest::Client::new(),
            TiktokClientConfig {
                user_agents: pool.clone(),
                ..config()
            },
        );
        for _ in 0..200 {
            let ua = client.pick_user_agent();
            assert!(pool.iter().any(|candidate| candidate == ua), "unexpected agent {ua}");
        }
    }

    #[test]
    fn single_entry_pool_is_always_used() {
        let client = TiktokCommentClient::new(
            reqwest::Client::new(),
            TiktokClientConfig {
                user_agents: vec!["feeltrack-test/1.0".to_string()],
                ..config()
            },
        );
        for _ in 0..20 {
            assert_eq!(client.pick_user_agent(), "feeltrack-test/1.0");
        }
    }

    #[test]
    fn empty_pool_falls_back() {
        let client = TiktokCommentClient::new(reqwest::Client::new(), config());
        assert_eq!(client.pick_user_agent(), FALLBACK_USER_AGENT);
    }

    #[test]
    fn api_status_zero_or_missing_is_ok() {
        check_api_status(&json!({"status_code": 0, "comments": []})).unwrap();
        check_api_status(&json!({"comments": []})).unwrap();
    }

    #[test]
    fn api_status_nonzero_is_error() {
        let err = check_api_status(&json!({"status_code": 8, "status_msg": "blocked"})).unwrap_err();
        match err {
            FetchError::Api {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 8);
                assert_eq!(message, "blocked");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
