use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};

use crate::config::PipelineConfig;
use crate::discovery::{discover_links, DiscoveryError};
use crate::fetch::{Fetcher, LogProgressSink, ProgressSink, ReqwestFetcher};
use crate::filename::{flac_filename, source_filename};
use crate::links::AudioLinkExtractor;
use crate::persist::{ensure_output_dir, PersistError};
use crate::publish::{ArtifactStore, PublishError, PublishReport, Publisher};
use crate::transcode::{TranscodeError, Transcoder};
use crate::{FetchError, JobId};

/// Where a job's staged source and converted output live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub source: PathBuf,
    pub flac: PathBuf,
}

impl JobPaths {
    pub fn for_url(url: &str, staging_dir: &Path, output_dir: &Path) -> Self {
        let source_name = source_filename(url);
        let flac_name = flac_filename(&source_name);
        Self {
            source: staging_dir.join(source_name),
            flac: output_dir.join(flac_name),
        }
    }

    pub fn plan(&self) -> JobPlan {
        if self.flac.exists() {
            if self.source.exists() {
                JobPlan::AlreadyConvertedSourceStaged
            } else {
                JobPlan::AlreadyConverted
            }
        } else if self.source.exists() {
            JobPlan::SourceStaged
        } else {
            JobPlan::NeedsDownload
        }
    }

    fn source_name(&self) -> String {
        display_name(&self.source)
    }

    fn flac_name(&self) -> String {
        display_name(&self.flac)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPlan {
    AlreadyConverted,
    /// Converted earlier, but the downloaded source was never cleaned up.
    AlreadyConvertedSourceStaged,
    SourceStaged,
    NeedsDownload,
}

/// IO services for one run: page scanning, downloads, conversion, cleanup and publishing.
pub struct Engine {
    config: PipelineConfig,
    page_fetcher: Arc<dyn Fetcher>,
    download_fetcher: Arc<dyn Fetcher>,
    transcoder: Arc<dyn Transcoder>,
    extractor: AudioLinkExtractor,
    sink: Arc<dyn ProgressSink>,
}

impl Engine {
    pub fn new(config: PipelineConfig, transcoder: Arc<dyn Transcoder>) -> Self {
        let page_fetcher = Arc::new(ReqwestFetcher::new(config.page_fetch.clone()));
        let download_fetcher = Arc::new(ReqwestFetcher::new(config.download_fetch.clone()));
        Self {
            config,
            page_fetcher,
            download_fetcher,
            transcoder,
            extractor: AudioLinkExtractor::new(),
            sink: Arc::new(LogProgressSink),
        }
    }

    pub fn with_fetchers(mut self, pages: Arc<dyn Fetcher>, downloads: Arc<dyn Fetcher>) -> Self {
        self.page_fetcher = pages;
        self.download_fetcher = downloads;
        self
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Creates the staging and output directories. Failure here is fatal to the run.
    pub fn prepare_dirs(&self) -> Result<(), PersistError> {
        ensure_output_dir(&self.config.staging_dir)?;
        ensure_output_dir(&self.config.output_dir)
    }

    pub async fn scan_page(&self, page_url: &str) -> Result<Vec<String>, DiscoveryError> {
        match discover_links(self.page_fetcher.as_ref(), &self.extractor, page_url).await {
            Ok(links) => {
                engine_info!("Scanned {} ({} .ra links)", page_url, links.len());
                Ok(links)
            }
            Err(err) => {
                engine_warn!("Failed to fetch {}: {}", page_url, err);
                Err(err)
            }
        }
    }

    pub fn job_paths(&self, url: &str) -> JobPaths {
        JobPaths::for_url(url, &self.config.staging_dir, &self.config.output_dir)
    }

    /// Inspects the filesystem to decide what the job still needs, logging skips.
    pub fn plan(&self, paths: &JobPaths) -> JobPlan {
        let plan = paths.plan();
        match plan {
            JobPlan::AlreadyConverted | JobPlan::AlreadyConvertedSourceStaged => {
                engine_info!("[Exists] {}, skip conversion.", paths.flac_name())
            }
            JobPlan::SourceStaged => engine_info!("[Exists] {}, skip download.", paths.source_name()),
            JobPlan::NeedsDownload => {}
        }
        plan
    }

    /// Downloads the job's source, returning the number of bytes written.
    pub async fn download(&self, job_id: JobId, url: &str, paths: &JobPaths) -> Result<u64, FetchError> {
        match self
            .download_fetcher
            .download(job_id, url, &paths.source, self.sink.as_ref())
            .await
        {
            Ok(output) => {
                engine_info!("[Downloaded] {}", paths.source_name());
                Ok(output.metadata.byte_len)
            }
            Err(err) => {
                engine_warn!("[Skipped] {} -> {}", url, err);
                Err(err)
            }
        }
    }

    pub async fn convert(&self, paths: &JobPaths) -> Result<PathBuf, TranscodeError> {
        match self.transcoder.to_flac(&paths.source, &paths.flac).await {
            Ok(path) => {
                engine_info!("[Converted] {} -> {}", paths.source_name(), paths.flac_name());
                Ok(path)
            }
            Err(err) => {
                engine_warn!("[Error] Conversion {}: {}", paths.source_name(), err);
                Err(err)
            }
        }
    }

    /// Deletes the staged source. Failures are logged and returned but never fail the job.
    pub async fn remove_source(&self, paths: &JobPaths) -> io::Result<()> {
        match tokio::fs::remove_file(&paths.source).await {
            Ok(()) => {
                engine_info!("[Removed] {}", paths.source_name());
                Ok(())
            }
            Err(err) => {
                engine_warn!("[Warning] Failed to remove {}: {}", paths.source_name(), err);
                Err(err)
            }
        }
    }

    pub async fn publish(&self, store: &dyn ArtifactStore) -> Result<PublishReport, PublishError> {
        Publisher::new(self.config.publish.clone())
            .publish(store)
            .await
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
