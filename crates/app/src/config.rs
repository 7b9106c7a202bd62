use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use feeltrack_infra::storage::OutputFormat;
use feeltrack_infra::tiktok::client::DEFAULT_USER_AGENTS;

const DEFAULT_MODEL_NAME: &str = "ZAMORAPJ/feeltrack-model";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub allowed_origins: Vec<String>,
    pub request_timeout: Duration,
    pub model_name: String,
    pub model_endpoint: String,
    pub model_token: Option<String>,
    pub max_batch_size: usize,
    pub harvest: HarvestConfig,
}

/// Everything one harvest run needs; handed to the session at construction.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub post_url: Option<String>,
    pub comments_endpoint: String,
    pub ms_token: String,
    pub x_bogus: String,
    pub web_id: String,
    pub user_agents: Vec<String>,
    pub max_retries: u32,
    pub request_delay: Duration,
    pub max_jitter: Duration,
    pub max_comments: usize,
    pub checkpoint_every: usize,
    pub output_dir: PathBuf,
    pub output_prefix: String,
    pub output_formats: Vec<OutputFormat>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid socket address: {0}")]
    InvalidSocket(String),
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr_raw = read_string("FEELTRACK_HTTP_ADDR", "127.0.0.1:8000");
        let http_addr = http_addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidSocket(http_addr_raw.clone()))?;
        let allowed_origins = read_list("FEELTRACK_ALLOWED_ORIGINS", ',');
        let request_timeout_secs = read_u64("FEELTRACK_REQUEST_TIMEOUT_SECS", 30)?;
        let model_name = read_string("FEELTRACK_MODEL_NAME", DEFAULT_MODEL_NAME);
        let default_endpoint = format!("https://api-inference.huggingface.co/models/{model_name}");
        let model_endpoint =
            read_optional_string("FEELTRACK_MODEL_ENDPOINT").unwrap_or(default_endpoint);
        let model_token = read_optional_string("FEELTRACK_MODEL_TOKEN");
        let max_batch_size = read_usize("FEELTRACK_MAX_BATCH_SIZE", 64)?;
        if max_batch_size == 0 {
            return Err(ConfigError::InvalidValue(
                "FEELTRACK_MAX_BATCH_SIZE",
                max_batch_size.to_string(),
            ));
        }

        Ok(Self {
            http_addr,
            allowed_origins,
            request_timeout: Duration::from_secs(request_timeout_secs),
            model_name,
            model_endpoint,
            model_token,
            max_batch_size,
            harvest: HarvestConfig::from_env()?,
        })
    }
}

impl HarvestConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let post_url = read_optional_string("FEELTRACK_POST_URL");
        let comments_endpoint = read_string(
            "FEELTRACK_COMMENTS_ENDPOINT",
            "https://www.tiktok.com/api/comment/list/",
        );
        if comments_endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "FEELTRACK_COMMENTS_ENDPOINT",
                comments_endpoint,
            ));
        }
        let ms_token = read_string("FEELTRACK_MS_TOKEN", "");
        let x_bogus = read_string("FEELTRACK_X_BOGUS", "");
        let web_id = read_string("FEELTRACK_WEB_ID", "7478343844027729413");
        let mut user_agents = read_list("FEELTRACK_USER_AGENTS", '|');
        if user_agents.is_empty() {
            user_agents = DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect();
        }
        let max_retries = read_u32("FEELTRACK_MAX_RETRIES", 3)?;
        let request_delay_ms = read_u64("FEELTRACK_REQUEST_DELAY_MS", 1500)?;
        let max_jitter_ms = read_u64("FEELTRACK_MAX_JITTER_MS", 1000)?;
        let max_comments = read_usize("FEELTRACK_MAX_COMMENTS", 10_000)?;
        let checkpoint_every = read_usize("FEELTRACK_CHECKPOINT_EVERY", 100)?;
        if checkpoint_every == 0 {
            return Err(ConfigError::InvalidValue(
                "FEELTRACK_CHECKPOINT_EVERY",
                checkpoint_every.to_string(),
            ));
        }
        let output_dir = PathBuf::from(read_string("FEELTRACK_OUTPUT_DIR", "data/raw"));
        let output_prefix = read_string("FEELTRACK_OUTPUT_PREFIX", "tiktok_comments");
        let output_formats = parse_formats(&read_string("FEELTRACK_OUTPUT_FORMATS", "csv,json"))?;

        Ok(Self {
            post_url,
            comments_endpoint,
            ms_token,
            x_bogus,
            web_id,
            user_agents,
            max_retries,
            request_delay: Duration::from_millis(request_delay_ms),
            max_jitter: Duration::from_millis(max_jitter_ms),
            max_comments,
            checkpoint_every,
            output_dir,
            output_prefix,
            output_formats,
        })
    }
}

fn parse_formats(raw: &str) -> Result<Vec<OutputFormat>, ConfigError> {
    let mut formats = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let format = OutputFormat::parse(part)
            .ok_or_else(|| ConfigError::InvalidValue("FEELTRACK_OUTPUT_FORMATS", part.to_string()))?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    if formats.is_empty() {
        return Err(ConfigError::InvalidValue(
            "FEELTRACK_OUTPUT_FORMATS",
            raw.to_string(),
        ));
    }
    Ok(formats)
}

pub fn load_dotenv() -> Result<(), std::io::Error> {
    let path = Path::new(".env");
    if !path.exists() {
        return Ok(());
    }
    let contents = std::fs::read_to_string(path)?;
    for (key, value) in contents.lines().filter_map(parse_dotenv_line) {
        if std::env::var_os(&key).is_none() {
            // Safety: invoked during startup before any threads are spawned.
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(())
}

fn read_string(key: &'static str, default: &'static str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn read_u32(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_usize(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_optional_string(key: &'static str) -> Option<String> {
    let value = std::env::var(key).unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn read_list(key: &'static str, separator: char) -> Vec<String> {
    split_list(&std::env::var(key).unwrap_or_default(), separator)
}

fn split_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_dotenv_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), unquote(value.trim())))
}

fn unquote(value: &str) -> String {
    if let Some(inner) = value.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        let mut output = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                output.push(ch);
                continue;
            }
            match chars.next() {
                Some('n') => output.push('\n'),
                Some('t') => output.push('\t'),
                Some(escaped @ ('\\' | '"')) => output.push(escaped),
                Some(other) => {
                    output.push('\\');
                    output.push(other);
                }
                None => output.push('\\'),
            }
        }
        return output;
    }
    if let Some(inner) = value.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        return inner.to_string();
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::{parse_dotenv_line, parse_formats, split_list, ConfigError};
    use feeltrack_infra::storage::OutputFormat;

    #[test]
    fn dotenv_line_plain_and_export() {
        assert_eq!(
            parse_dotenv_line("FEELTRACK_MS_TOKEN=abc"),
            Some(("FEELTRACK_MS_TOKEN".to_string(), "abc".to_string()))
        );
        assert_eq!(
            parse_dotenv_line("export FEELTRACK_WEB_ID=123"),
            Some(("FEELTRACK_WEB_ID".to_string(), "123".to_string()))
        );
    }

    #[test]
    fn dotenv_line_quotes() {
        let (_, value) = parse_dotenv_line(r#"ALLOWED="a, b""#).unwrap();
        assert_eq!(value, "a, b");
        let (_, value) = parse_dotenv_line(r#"MSG="line\n\"quoted\"""#).unwrap();
        assert_eq!(value, "line\n\"quoted\"");
        let (_, value) = parse_dotenv_line(r"RAW='no\nescape'").unwrap();
        assert_eq!(value, r"no\nescape");
    }

    #[test]
    fn dotenv_line_skips_comments_and_blanks() {
        assert!(parse_dotenv_line("# FEELTRACK_X_BOGUS=1").is_none());
        assert!(parse_dotenv_line("   ").is_none());
        assert!(parse_dotenv_line("=value").is_none());
    }

    #[test]
    fn split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list(" https://a.example , ,https://b.example", ','),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(split_list("", ',').is_empty());
    }

    #[test]
    fn formats_parse_and_dedupe() {
        assert_eq!(
            parse_formats("csv, json,csv").unwrap(),
            vec![OutputFormat::Csv, OutputFormat::Json]
        );
        assert!(matches!(
            parse_formats("xlsx"),
            Err(ConfigError::InvalidValue("FEELTRACK_OUTPUT_FORMATS", _))
        ));
        assert!(parse_formats(" , ").is_err());
    }
}
