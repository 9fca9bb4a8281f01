//! ra2flac engine: fetching, discovery, conversion and publishing.
mod config;
mod decode;
mod discovery;
mod engine;
mod fetch;
mod filename;
mod links;
mod persist;
mod publish;
mod transcode;
mod types;

pub use config::{PipelineConfig, DEFAULT_OUTPUT_DIR, DEFAULT_SOURCE_PAGES, DEFAULT_STAGING_DIR};
pub use decode::{decode_html, DecodedHtml};
pub use discovery::{discover_links, DiscoveryError};
pub use engine::{Engine, JobPaths, JobPlan};
pub use fetch::{FetchSettings, Fetcher, LogProgressSink, ProgressSink, ReqwestFetcher};
pub use filename::{flac_filename, source_filename};
pub use links::AudioLinkExtractor;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, StagedFile};
pub use publish::{
    collect_artifacts, ArtifactStore, CommitIdentity, GitRepository, PublishError, PublishReport,
    PublishSettings, Publisher, DEFAULT_COMMIT_MESSAGE,
};
pub use transcode::{FfmpegTranscoder, TranscodeError, Transcoder};
pub use types::{
    DownloadOutput, EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, JobId,
    JobProgress,
};
