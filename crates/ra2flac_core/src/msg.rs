use crate::{JobId, ManualUrls, PublishOutcome};

/// What a job still needs after its target paths have been inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparePlan {
    /// The FLAC file already exists; nothing to do.
    AlreadyConverted,
    /// The FLAC file already exists but a stale source is still staged.
    AlreadyConvertedSourceStaged,
    /// The source was downloaded by an earlier run and is still staged.
    SourceStaged,
    NeedsDownload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Operator dispatched a run.
    Start {
        manual: ManualUrls,
        source_pages: Vec<String>,
        publish: bool,
    },
    /// A source page was scanned; `links` are absolute `.ra` URLs in document order.
    PageScanned { page_url: String, links: Vec<String> },
    /// A source page could not be fetched or decoded.
    PageFailed { page_url: String, reason: String },
    JobPrepared {
        job_id: JobId,
        result: Result<PreparePlan, String>,
    },
    /// Download outcome; `Ok` carries the number of bytes written.
    DownloadFinished {
        job_id: JobId,
        result: Result<u64, String>,
    },
    ConversionFinished {
        job_id: JobId,
        result: Result<(), String>,
    },
    /// Staged source cleanup finished. Removal problems are warnings only.
    SourceRemoved { job_id: JobId },
    PublishFinished {
        result: Result<PublishOutcome, String>,
    },
}
