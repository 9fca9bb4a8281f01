use crate::JobId;

/// Side effects requested by [`crate::update`]. Each one is answered by exactly one [`crate::Msg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch a source page and report the `.ra` links found on it.
    ScanPage { page_url: String },
    /// Work out what the job still needs (nothing, conversion only, or a download).
    Prepare { job_id: JobId, url: String },
    Download { job_id: JobId, url: String },
    Convert { job_id: JobId },
    /// Delete the staged source once its FLAC is in place.
    RemoveSource { job_id: JobId },
    Publish,
}
