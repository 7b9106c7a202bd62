use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::HarvestConfig;
use crate::jobs::JobError;
use crate::state::AppState;
use feeltrack_core::domain::comments::CommentRecord;
use feeltrack_core::types::post_url::PostUrl;
use feeltrack_infra::storage::{CheckpointStore, OutputFormat};
use feeltrack_infra::tiktok::{
    parse_page, CommentSource, FetchError, TiktokClientConfig, TiktokCommentClient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    NoMorePages,
    NoData,
    FetchFailed,
    CapReached,
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Done(StopReason),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub max_retries: u32,
    pub request_delay: Duration,
    pub max_jitter: Duration,
    pub max_comments: usize,
    pub checkpoint_every: usize,
}

impl From<&HarvestConfig> for SessionSettings {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            request_delay: config.request_delay,
            max_jitter: config.max_jitter,
            max_comments: config.max_comments,
            checkpoint_every: config.checkpoint_every,
        }
    }
}

#[derive(Debug)]
pub struct HarvestReport {
    pub post_id: String,
    pub records: usize,
    pub pages: usize,
    pub checkpoints: usize,
    pub failed_checkpoints: usize,
    pub stop_reason: StopReason,
    pub final_files: Vec<PathBuf>,
    pub final_failed: Vec<OutputFormat>,
}

pub async fn run<F>(state: &AppState, post_url: &str, shutdown: F) -> Result<HarvestReport, JobError>
where
    F: Future<Output = ()>,
{
    let post = PostUrl::try_from(post_url)?;
    let harvest = &state.config.harvest;
    info!(
        post_id = post.post_id(),
        author = post.author().unwrap_or("-"),
        max_comments = harvest.max_comments,
        "harvest starting"
    );
    let client = TiktokCommentClient::new(
        state.http_client.clone(),
        TiktokClientConfig {
            endpoint: harvest.comments_endpoint.clone(),
            ms_token: harvest.ms_token.clone(),
            x_bogus: harvest.x_bogus.clone(),
            web_id: harvest.web_id.clone(),
            user_agents: harvest.user_agents.clone(),
        },
    );
    let store = CheckpointStore::new(
        harvest.output_dir.clone(),
        harvest.output_prefix.clone(),
        harvest.output_formats.clone(),
    );
    debug!(output_dir = %store.output_dir().display(), "checkpoint store ready");
    let session = HarvestSession::new(client, store, SessionSettings::from(harvest), post.post_id());
    Ok(session.run(shutdown).await)
}

/// Sequential pagination over one post's comments.
///
/// Records are only appended after a page is fetched and parsed, and the
/// cursor only moves at the same point, so interrupting between awaits never
/// leaves a half-applied page.
pub struct HarvestSession<S> {
    source: S,
    store: CheckpointStore,
    settings: SessionSettings,
    post_id: String,
    records: Vec<CommentRecord>,
    cursor: u64,
    state: SessionState,
    pages: usize,
    checkpoints: usize,
    failed_checkpoints: usize,
    checkpointed_batches: usize,
}

impl<S: CommentSource> HarvestSession<S> {
    pub fn new(source: S, store: CheckpointStore, mut settings: SessionSettings, post_id: &str) -> Self {
        if settings.checkpoint_every == 0 {
            warn!("checkpoint_every of 0 treated as 1");
            settings.checkpoint_every = 1;
        }
        Self {
            source,
            store,
            settings,
            post_id: post_id.to_string(),
            records: Vec::new(),
            cursor: 0,
            state: SessionState::Running,
            pages: 0,
            checkpoints: 0,
            failed_checkpoints: 0,
            checkpointed_batches: 0,
        }
    }

    pub async fn run<F>(mut self, shutdown: F) -> HarvestReport
    where
        F: Future<Output = ()>,
    {
        let reason = tokio::select! {
            reason = self.drive() => reason,
            () = shutdown => StopReason::Interrupted,
        };
        if reason == StopReason::Interrupted {
            warn!(post_id = %self.post_id, total = self.records.len(), "harvest interrupted");
        }
        self.finish(reason)
    }

    async fn drive(&mut self) -> StopReason {
        loop {
            self.state = self.step().await;
            if let SessionState::Done(reason) = self.state {
                return reason;
            }
            sleep(jittered_delay(self.settings.request_delay, self.settings.max_jitter)).await;
        }
    }

    /// Fetches, parses and applies one page, returning the next state.
    async fn step(&mut self) -> SessionState {
        if self.records.len() >= self.settings.max_comments {
            return SessionState::Done(StopReason::CapReached);
        }
        let payload = match self.fetch_page().await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(post_id = %self.post_id, cursor = self.cursor, error = %err, "page fetch failed");
                return SessionState::Done(StopReason::FetchFailed);
            }
        };
        self.pages += 1;
        let Some(page) = parse_page(&payload, self.cursor) else {
            info!(post_id = %self.post_id, cursor = self.cursor, "no more comment data");
            return SessionState::Done(StopReason::NoData);
        };
        self.append(page.comments);
        self.cursor = page.next_cursor;
        info!(
            total = self.records.len(),
            cursor = self.cursor,
            skipped = page.skipped,
            "comment page harvested"
        );
        self.checkpoint_if_due();

        if !page.has_more {
            SessionState::Done(StopReason::NoMorePages)
        } else if self.records.len() >= self.settings.max_comments {
            SessionState::Done(StopReason::CapReached)
        } else {
            SessionState::Running
        }
    }

    async fn fetch_page(&self) -> Result<Value, FetchError> {
        let mut attempt = 0;
        loop {
            match self.source.request_page(&self.post_id, self.cursor).await {
                Ok(payload) => return Ok(payload),
                Err(err) if attempt < self.settings.max_retries => {
                    attempt += 1;
                    let delay = backoff_delay(self.settings.request_delay, attempt);
                    warn!(
                        cursor = self.cursor,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "page request failed; retrying"
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    return Err(FetchError::Exhausted {
                        attempts: attempt + 1,
                        last: Box::new(err),
                    });
                }
            }
        }
    }

    fn append(&mut self, comments: Vec<CommentRecord>) {
        let room = self.settings.max_comments.saturating_sub(self.records.len());
        if comments.len() > room {
            debug!(
                dropped = comments.len() - room,
                "page truncated at comment cap"
            );
        }
        self.records.extend(comments.into_iter().take(room));
    }

    fn checkpoint_if_due(&mut self) {
        let batches = self.records.len() / self.settings.checkpoint_every;
        if batches <= self.checkpointed_batches {
            return;
        }
        self.checkpointed_batches = batches;
        let suffix = format!("partial_{}", self.records.len());
        let saved = self.store.save(&self.records, &self.post_id, Some(&suffix));
        if saved.written.is_empty() {
            self.failed_checkpoints += 1;
            warn!(post_id = %self.post_id, total = self.records.len(), "partial checkpoint lost");
        } else {
            self.checkpoints += 1;
        }
    }

    fn finish(mut self, reason: StopReason) -> HarvestReport {
        self.state = SessionState::Done(reason);
        debug!(state = ?self.state, pages = self.pages, "harvest session closed");
        let saved = self.store.save(&self.records, &self.post_id, None);
        if !saved.failed.is_empty() {
            warn!(post_id = %self.post_id, failed = ?saved.failed, "final snapshot incomplete");
        }
        if self.records.is_empty() {
            info!(post_id = %self.post_id, "harvest finished without comments");
        } else {
            info!(post_id = %self.post_id, total = self.records.len(), "harvest finished");
        }
        HarvestReport {
            post_id: self.post_id,
            records: self.records.len(),
            pages: self.pages,
            checkpoints: self.checkpoints,
            failed_checkpoints: self.failed_checkpoints,
            stop_reason: reason,
            final_files: saved.written,
            final_failed: saved.failed,
        }
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}

fn jittered_delay(base: Duration, max_jitter: Duration) -> Duration {
    let max_jitter_ms = max_jitter.as_millis() as u64;
    if max_jitter_ms == 0 {
        return base;
    }
    let jitter_ms = rand::thread_rng().gen_range(0..max_jitter_ms);
    base.saturating_add(Duration::from_millis(jitter_ms))
}
