use std::collections::{BTreeMap, HashSet};

use url::Url;

use crate::summary::{JobFailure, RunSummary};
use crate::Effect;

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Queued,
    Downloading,
    Converting,
    Cleaning,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobResultKind {
    Converted,
    AlreadyPresent,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Discovering,
    Processing,
    Publishing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing differed from `HEAD`; no commit was made.
    NoChanges,
    Committed { files: usize, pushed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub job_id: JobId,
    pub url: String,
    pub stage: Stage,
    pub outcome: Option<JobResultKind>,
    pub bytes: Option<u64>,
    pub error: Option<String>,
}

impl Job {
    fn new(job_id: JobId, url: String) -> Self {
        Self {
            job_id,
            url,
            stage: Stage::Queued,
            outcome: None,
            bytes: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    phase: RunPhase,
    publish: bool,
    pending_pages: usize,
    failed_pages: Vec<(String, String)>,
    resolved: Vec<String>,
    seen: HashSet<String>,
    jobs: BTreeMap<JobId, Job>,
    next_job_id: JobId,
    current: Option<JobId>,
    publish_result: Option<Result<PublishOutcome, String>>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            next_job_id: 1,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn current_job(&self) -> Option<JobId> {
        self.current
    }

    pub fn job(&self, job_id: JobId) -> Option<&Job> {
        self.jobs.get(&job_id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            phase: self.phase,
            resolved: self.jobs.len(),
            failed_pages: self.failed_pages.clone(),
            ..RunSummary::default()
        };
        for job in self.jobs.values() {
            match job.outcome {
                Some(JobResultKind::Converted) => summary.converted += 1,
                Some(JobResultKind::AlreadyPresent) => summary.already_present += 1,
                Some(JobResultKind::Failed) => {
                    summary.failed += 1;
                    summary.failures.push(JobFailure {
                        job_id: job.job_id,
                        url: job.url.clone(),
                        reason: job.error.clone().unwrap_or_default(),
                    });
                }
                None => {}
            }
        }
        match &self.publish_result {
            Some(Ok(outcome)) => summary.publish = Some(*outcome),
            Some(Err(reason)) => summary.publish_error = Some(reason.clone()),
            None => {}
        }
        summary
    }

    pub(crate) fn set_publish(&mut self, publish: bool) {
        self.publish = publish;
    }

    pub(crate) fn begin_discovery(&mut self, pages: usize) {
        self.phase = RunPhase::Discovering;
        self.pending_pages = pages;
    }

    pub(crate) fn page_reported(&mut self) {
        self.pending_pages = self.pending_pages.saturating_sub(1);
    }

    pub(crate) fn discovery_complete(&self) -> bool {
        self.pending_pages == 0
    }

    pub(crate) fn record_page_failure(&mut self, page_url: String, reason: String) {
        self.failed_pages.push((page_url, reason));
    }

    /// Adds URLs to the resolution list, skipping ones already seen.
    pub(crate) fn collect_urls(&mut self, urls: impl IntoIterator<Item = String>) {
        for url in urls {
            if self.seen.insert(normalize_url_for_dedupe(&url)) {
                self.resolved.push(url);
            }
        }
    }

    /// Turns the resolution list into queued jobs and enters the processing phase.
    pub(crate) fn create_jobs(&mut self) {
        self.phase = RunPhase::Processing;
        for url in std::mem::take(&mut self.resolved) {
            let job_id = self.next_job_id;
            self.next_job_id += 1;
            self.jobs.insert(job_id, Job::new(job_id, url));
        }
    }

    pub(crate) fn is_current(&self, job_id: JobId) -> bool {
        self.phase == RunPhase::Processing && self.current == Some(job_id)
    }

    pub(crate) fn set_stage(&mut self, job_id: JobId, stage: Stage) {
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.stage = stage;
        }
    }

    pub(crate) fn set_bytes(&mut self, job_id: JobId, bytes: u64) {
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.bytes = Some(bytes);
        }
    }

    pub(crate) fn job_url(&self, job_id: JobId) -> Option<String> {
        self.jobs.get(&job_id).map(|job| job.url.clone())
    }

    pub(crate) fn finish_job(&mut self, job_id: JobId, outcome: JobResultKind) {
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.stage = Stage::Done;
            job.outcome = Some(outcome);
        }
        if self.current == Some(job_id) {
            self.current = None;
        }
    }

    pub(crate) fn fail_job(&mut self, job_id: JobId, reason: String) {
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.error = Some(reason);
        }
        self.finish_job(job_id, JobResultKind::Failed);
    }

    /// Starts the next queued job, or moves on to publishing once every job is terminal.
    ///
    /// Only one job is in flight at a time.
    pub(crate) fn advance(&mut self) -> Vec<Effect> {
        if self.current.is_some() {
            return Vec::new();
        }
        let next = self
            .jobs
            .values()
            .find(|job| !job.is_terminal() && job.stage == Stage::Queued)
            .map(|job| (job.job_id, job.url.clone()));

        match next {
            Some((job_id, url)) => {
                self.current = Some(job_id);
                vec![Effect::Prepare { job_id, url }]
            }
            None if self.publish => {
                self.phase = RunPhase::Publishing;
                vec![Effect::Publish]
            }
            None => {
                self.phase = RunPhase::Finished;
                Vec::new()
            }
        }
    }

    pub(crate) fn finish_publish(&mut self, result: Result<PublishOutcome, String>) {
        self.publish_result = Some(result);
        self.phase = RunPhase::Finished;
    }
}

/// Normalizes a URL for duplicate detection.
///
/// Scheme and host are lower-cased by parsing and the fragment is dropped.
/// Strings that do not parse are compared by their trimmed form.
pub fn normalize_url_for_dedupe(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}
