//! End-of-run reporting: log lines, JSON summary file and exit status.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use engine_logging::{engine_error, engine_info, engine_warn};
use ra2flac_core::{PublishOutcome, RunSummary};
use ra2flac_engine::AtomicFileWriter;
use serde::Serialize;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FATAL: i32 = 1;
pub const EXIT_JOB_FAILURES: i32 = 2;

#[derive(Debug, Clone, Serialize)]
struct SummaryRecord {
    finished_utc: String,
    manual_urls: String,
    resolved: usize,
    converted: usize,
    already_present: usize,
    failed: usize,
    failures: Vec<FailureRecord>,
    failed_pages: Vec<FailureRecord>,
    publish: Option<String>,
    committed_files: Option<usize>,
    pushed: Option<bool>,
    publish_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct FailureRecord {
    url: String,
    reason: String,
}

pub fn log_summary(summary: &RunSummary) {
    for (page, reason) in &summary.failed_pages {
        engine_warn!("Source page {} skipped: {}", page, reason);
    }
    for failure in &summary.failures {
        engine_warn!("[Error] job {} {}: {}", failure.job_id, failure.url, failure.reason);
    }
    engine_info!(
        "Run finished: {} resolved, {} converted, {} already present, {} failed",
        summary.resolved,
        summary.converted,
        summary.already_present,
        summary.failed
    );
    match (&summary.publish, &summary.publish_error) {
        (Some(PublishOutcome::NoChanges), _) => engine_info!("Publish: no changes"),
        (Some(PublishOutcome::Committed { files, pushed }), _) => {
            engine_info!("Publish: committed {} file(s), pushed={}", files, pushed)
        }
        (None, Some(err)) => engine_error!("Publish failed: {}", err),
        (None, None) => {}
    }
}

pub fn summary_json(summary: &RunSummary, manual_urls: &str) -> Result<String> {
    let (publish, committed_files, pushed) = match summary.publish {
        Some(PublishOutcome::NoChanges) => (Some("no_changes".to_string()), None, None),
        Some(PublishOutcome::Committed { files, pushed }) => {
            (Some("committed".to_string()), Some(files), Some(pushed))
        }
        None => (None, None, None),
    };
    let record = SummaryRecord {
        finished_utc: Utc::now().to_rfc3339(),
        manual_urls: manual_urls.to_string(),
        resolved: summary.resolved,
        converted: summary.converted,
        already_present: summary.already_present,
        failed: summary.failed,
        failures: summary
            .failures
            .iter()
            .map(|f| FailureRecord {
                url: f.url.clone(),
                reason: f.reason.clone(),
            })
            .collect(),
        failed_pages: summary
            .failed_pages
            .iter()
            .map(|(url, reason)| FailureRecord {
                url: url.clone(),
                reason: reason.clone(),
            })
            .collect(),
        publish,
        committed_files,
        pushed,
        publish_error: summary.publish_error.clone(),
    };
    serde_json::to_string_pretty(&record).context("failed to serialize run summary")
}

pub fn write_summary(path: &Path, summary: &RunSummary, manual_urls: &str) -> Result<()> {
    let json = summary_json(summary, manual_urls)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("summary path has no file name")?;
    AtomicFileWriter::new(dir)
        .write(filename, json.as_bytes())
        .with_context(|| format!("failed to write summary to {}", path.display()))?;
    Ok(())
}

/// Publisher failures are fatal; job failures only count under `strict`.
pub fn exit_code(summary: &RunSummary, strict: bool) -> i32 {
    if summary.publish_error.is_some() {
        EXIT_FATAL
    } else if strict && summary.has_failed_jobs() {
        EXIT_JOB_FAILURES
    } else {
        EXIT_OK
    }
}
