pub mod tasks;

use std::future::Future;

use thiserror::Error;
use tracing::{info, warn};

use crate::state::AppState;
use tasks::comment_harvest::HarvestReport;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid post url: {0}")]
    PostUrl(#[from] feeltrack_core::error::CoreError),
    #[error("no post url configured; pass --post-url or set FEELTRACK_POST_URL")]
    MissingPostUrl,
}

/// Harvests the configured post once. `shutdown` resolving ends the run early
/// with a final checkpoint.
pub async fn run_harvest<F>(state: AppState, shutdown: F) -> Result<HarvestReport, JobError>
where
    F: Future<Output = ()>,
{
    let post_url = state
        .config
        .harvest
        .post_url
        .as_deref()
        .ok_or(JobError::MissingPostUrl)?;
    let report = tasks::comment_harvest::run(&state, post_url, shutdown).await?;
    info!(
        post_id = %report.post_id,
        records = report.records,
        pages = report.pages,
        checkpoints = report.checkpoints,
        failed_checkpoints = report.failed_checkpoints,
        stop_reason = ?report.stop_reason,
        files = ?report.final_files,
        "harvest summary"
    );
    if !report.final_failed.is_empty() {
        warn!(
            post_id = %report.post_id,
            failed = ?report.final_failed,
            records = report.records,
            "final snapshot not fully written"
        );
    }
    Ok(report)
}
