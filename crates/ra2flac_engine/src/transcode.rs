//! FLAC conversion through an external media tool.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::persist::{PersistError, StagedFile};

const FFMPEG: &str = "ffmpeg";

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("media tool {0:?} not found")]
    ToolNotFound(String),
    #[error("failed to execute {tool:?}: {source}")]
    Spawn {
        tool: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("conversion failed (exit code {code:?}): {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("could not place converted file: {0}")]
    Persist(#[from] PersistError),
}

/// Converts a source audio file into FLAC.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Writes the FLAC rendition of `source` to `target`.
    ///
    /// Nothing appears at `target` unless the conversion succeeded and produced
    /// a non-empty file.
    async fn to_flac(&self, source: &Path, target: &Path) -> Result<PathBuf, TranscodeError>;
}

/// Runs the `ffmpeg` binary:
/// `ffmpeg -i <source> -c:a flac -f flac <tmp> -loglevel error -y`, then renames `<tmp>` to the target.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary_path: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Looks `ffmpeg` up on `PATH`.
    pub fn from_path() -> Result<Self, TranscodeError> {
        Self::locate(OsStr::new(FFMPEG))
    }

    /// Resolves an explicit binary (absolute path or bare name) to an executable.
    pub fn locate(binary: &OsStr) -> Result<Self, TranscodeError> {
        which::which(binary)
            .map(Self::new)
            .map_err(|_| TranscodeError::ToolNotFound(binary.to_string_lossy().into_owned()))
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// First line of `ffmpeg -version`, for the start-up log.
    pub async fn version(&self) -> Result<String, TranscodeError> {
        let output = Command::new(&self.binary_path)
            .arg("-version")
            .output()
            .await
            .map_err(|source| self.spawn_error(source))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    fn spawn_error(&self, source: io::Error) -> TranscodeError {
        TranscodeError::Spawn {
            tool: self.binary_path.clone(),
            source,
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn to_flac(&self, source: &Path, target: &Path) -> Result<PathBuf, TranscodeError> {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let staged = StagedFile::new_in(dir)?;

        let output = Command::new(&self.binary_path)
            .arg("-i")
            .arg(source)
            .args(["-c:a", "flac", "-f", "flac"])
            .arg(staged.path())
            .args(["-loglevel", "error", "-y"])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| self.spawn_error(source))?;

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(staged.persist(target)?)
    }
}
