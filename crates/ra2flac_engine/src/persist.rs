use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("refusing to persist empty file {0:?}")]
    Empty(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;
        let mut staged = StagedFile::new_in(&self.dir)?;
        staged.write_chunk(content)?;
        staged.persist_allow_empty(&self.dir.join(filename))
    }
}

/// A file being filled in place, invisible under its final name until persisted.
///
/// Dropping it without persisting deletes the temp file.
pub struct StagedFile {
    tmp: NamedTempFile,
    written: u64,
}

impl StagedFile {
    pub fn new_in(dir: &Path) -> Result<Self, PersistError> {
        let tmp = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(dir)?;
        Ok(Self { tmp, written: 0 })
    }

    /// Temp path, for external tools that write the content themselves.
    pub fn path(&self) -> &Path {
        self.tmp.path()
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), PersistError> {
        self.tmp.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Renames the temp file to `target`, refusing zero-byte content.
    pub fn persist(self, target: &Path) -> Result<PathBuf, PersistError> {
        let len = fs::metadata(self.tmp.path())?.len();
        if len == 0 {
            return Err(PersistError::Empty(target.to_path_buf()));
        }
        self.persist_allow_empty(target)
    }

    fn persist_allow_empty(mut self, target: &Path) -> Result<PathBuf, PersistError> {
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;

        // Rename over any existing target so it is never missing.
        self.tmp
            .persist(target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(target.to_path_buf())
    }
}
