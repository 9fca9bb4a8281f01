use crate::{JobId, PublishOutcome, RunPhase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub job_id: JobId,
    pub url: String,
    pub reason: String,
}

/// Counts and failures of a run, as reported at the end.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub phase: RunPhase,
    /// Number of distinct source URLs that became jobs.
    pub resolved: usize,
    pub converted: usize,
    pub already_present: usize,
    pub failed: usize,
    pub failures: Vec<JobFailure>,
    /// `(page_url, reason)` for source pages that could not be scanned.
    pub failed_pages: Vec<(String, String)>,
    pub publish: Option<PublishOutcome>,
    pub publish_error: Option<String>,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.phase == RunPhase::Finished
    }

    pub fn has_failed_jobs(&self) -> bool {
        self.failed > 0
    }
}
