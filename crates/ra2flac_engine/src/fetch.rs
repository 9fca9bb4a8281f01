use std::path::Path;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use engine_logging::engine_debug;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::persist::{PersistError, StagedFile};
use crate::{
    DownloadOutput, EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, JobId,
    JobProgress,
};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Empty accepts any content type.
    pub allowed_content_types: Vec<String>,
    /// Accept only `200 OK` rather than any 2xx status.
    pub require_ok: bool,
}

impl FetchSettings {
    /// Settings for source pages scanned during discovery.
    pub fn for_pages() -> Self {
        Self::default()
    }

    /// Settings for `.ra` downloads.
    pub fn for_downloads() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            max_bytes: 512 * 1024 * 1024,
            allowed_content_types: Vec::new(),
            require_ok: true,
            ..Self::default()
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            require_ok: false,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Sink that reports download progress through the debug log.
#[derive(Debug, Default)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::Progress(JobProgress {
                job_id,
                bytes,
                total,
            }) => engine_debug!("job {} downloaded {} of {:?} bytes", job_id, bytes, total),
            EngineEvent::DownloadCompleted { job_id, bytes } => {
                engine_debug!("job {} download complete ({} bytes)", job_id, bytes)
            }
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a page into memory.
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError>;

    /// Stream a resource to `target`. Nothing appears at `target` unless the whole body arrived.
    async fn download(
        &self,
        job_id: JobId,
        url: &str,
        target: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<DownloadOutput, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    fn build_client(&self, redirect_counter: Arc<AtomicUsize>) -> Result<reqwest::Client, FetchError> {
        let redirect_limit = self.settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            redirect_counter.store(count, Ordering::Relaxed);
            if count >= redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(policy)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        if self.settings.allowed_content_types.is_empty() {
            return true;
        }
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    /// Sends the request and applies status, size and content-type checks.
    async fn open(
        &self,
        url: &str,
        redirect_counter: Arc<AtomicUsize>,
    ) -> Result<(reqwest::Response, Option<String>), FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = self.build_client(redirect_counter)?;

        let response = client.get(parsed).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let accepted = if self.settings.require_ok {
            status == StatusCode::OK
        } else {
            status.is_success()
        };
        if !accepted {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(Some(content_len)));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        Ok((response, content_type))
    }

    fn too_large(&self, actual: Option<u64>) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual,
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let (response, content_type) = self.open(url, redirect_counter.clone()).await?;
        let final_url = response.url().to_string();

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            redirect_count: redirect_counter.load(Ordering::Relaxed),
            content_type,
            byte_len: bytes.len() as u64,
        };

        Ok(FetchOutput { bytes, metadata })
    }

    async fn download(
        &self,
        job_id: JobId,
        url: &str,
        target: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<DownloadOutput, FetchError> {
        let dir = target
            .parent()
            .ok_or_else(|| FetchError::new(FailureKind::Io, "download target has no parent"))?;
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let (response, content_type) = self.open(url, redirect_counter.clone()).await?;
        let final_url = response.url().to_string();
        let total = response.content_length();

        let mut staged = StagedFile::new_in(dir).map_err(map_persist_error)?;
        sink.emit(EngineEvent::Progress(JobProgress {
            job_id,
            bytes: 0,
            total,
        }));

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = staged.written() + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(Some(next_len)));
            }
            staged.write_chunk(&chunk).map_err(map_persist_error)?;
            sink.emit(EngineEvent::Progress(JobProgress {
                job_id,
                bytes: staged.written(),
                total,
            }));
        }

        let byte_len = staged.written();
        let path = staged.persist(target).map_err(map_persist_error)?;
        sink.emit(EngineEvent::DownloadCompleted {
            job_id,
            bytes: byte_len,
        });

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            redirect_count: redirect_counter.load(Ordering::Relaxed),
            content_type,
            byte_len,
        };

        Ok(DownloadOutput { path, metadata })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

fn map_persist_error(err: PersistError) -> FetchError {
    FetchError::new(FailureKind::Io, err.to_string())
}
