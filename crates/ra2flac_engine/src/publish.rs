//! Committing converted artifacts back to version control.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use engine_logging::{engine_debug, engine_info};
use thiserror::Error;
use tokio::process::Command;

pub const DEFAULT_COMMIT_MESSAGE: &str = "Add converted FLAC files";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("git executable not found")]
    GitNotFound,
    #[error("{path:?} is not inside a git work tree")]
    NotARepository { path: PathBuf },
    #[error("failed to execute git: {0}")]
    Spawn(#[source] io::Error),
    #[error("`git {command}` failed (exit code {code:?}): {stderr}")]
    Command {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("failed to list artifacts in {dir:?}: {source}")]
    Scan {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Author and committer identity for automated commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl Default for CommitIdentity {
    fn default() -> Self {
        Self {
            name: "github-actions[bot]".to_string(),
            email: "github-actions[bot]@users.noreply.github.com".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub identity: CommitIdentity,
    pub message: String,
    /// Directory whose artifacts are staged and committed.
    pub artifact_dir: PathBuf,
    pub extension: String,
    pub push: bool,
}

impl PublishSettings {
    pub fn new(artifact_dir: PathBuf) -> Self {
        Self {
            identity: CommitIdentity::default(),
            message: DEFAULT_COMMIT_MESSAGE.to_string(),
            artifact_dir,
            extension: "flac".to_string(),
            push: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishReport {
    NoChanges,
    Committed { files: Vec<String>, pushed: bool },
}

/// Storage backend the publisher records artifacts in.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn configure_identity(&self, identity: &CommitIdentity) -> Result<(), PublishError>;

    async fn stage(&self, paths: &[PathBuf]) -> Result<(), PublishError>;

    /// Staged paths under `scope` that differ from the last recorded state.
    async fn staged_changes(&self, scope: &Path) -> Result<Vec<String>, PublishError>;

    /// Records the staged changes under `scope` as one commit.
    async fn commit(&self, message: &str, scope: &Path) -> Result<(), PublishError>;

    async fn push(&self) -> Result<(), PublishError>;
}

pub struct Publisher {
    settings: PublishSettings,
}

impl Publisher {
    pub fn new(settings: PublishSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PublishSettings {
        &self.settings
    }

    /// Stages every artifact, then commits and pushes only if something changed.
    ///
    /// Creates at most one commit per call.
    pub async fn publish(&self, store: &dyn ArtifactStore) -> Result<PublishReport, PublishError> {
        store.configure_identity(&self.settings.identity).await?;

        let artifacts = collect_artifacts(&self.settings.artifact_dir, &self.settings.extension)?;
        if artifacts.is_empty() {
            engine_info!("No .{} files to stage", self.settings.extension);
        } else {
            engine_debug!("Staging {} artifact(s)", artifacts.len());
            store.stage(&artifacts).await?;
        }

        let scope = absolute(&self.settings.artifact_dir);
        let changed = store.staged_changes(&scope).await?;
        if changed.is_empty() {
            engine_info!("No changes to commit");
            return Ok(PublishReport::NoChanges);
        }

        store.commit(&self.settings.message, &scope).await?;
        engine_info!("Committed {} file(s): {}", changed.len(), self.settings.message);

        if self.settings.push {
            store.push().await?;
            engine_info!("Pushed");
        }

        Ok(PublishReport::Committed {
            files: changed,
            pushed: self.settings.push,
        })
    }
}

/// Files in `dir` with the given extension, sorted. A missing directory yields nothing.
pub fn collect_artifacts(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PublishError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(PublishError::Scan {
                dir: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .map(|path| absolute(&path))
        .collect();
    paths.sort();
    Ok(paths)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// [`ArtifactStore`] backed by the `git` command line in an existing work tree.
#[derive(Debug, Clone)]
pub struct GitRepository {
    git: PathBuf,
    root: PathBuf,
    remote: String,
}

impl GitRepository {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, PublishError> {
        let git = which::which("git").map_err(|_| PublishError::GitNotFound)?;
        let repo = Self {
            git,
            root: absolute(&root.into()),
            remote: "origin".to_string(),
        };
        let inside = repo.run(&["rev-parse", "--is-inside-work-tree"]).await;
        match inside {
            Ok(out) if out.trim() == "true" => Ok(repo),
            _ => Err(PublishError::NotARepository { path: repo.root }),
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn run(&self, args: &[&str]) -> Result<String, PublishError> {
        self.run_with_paths(args, &[]).await
    }

    async fn run_with_paths(&self, args: &[&str], paths: &[&Path]) -> Result<String, PublishError> {
        let mut command = Command::new(&self.git);
        command.current_dir(&self.root).args(args);
        if !paths.is_empty() {
            command.arg("--").args(paths);
        }
        let output = command.output().await.map_err(PublishError::Spawn)?;
        if !output.status.success() {
            return Err(PublishError::Command {
                command: args.join(" "),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ArtifactStore for GitRepository {
    async fn configure_identity(&self, identity: &CommitIdentity) -> Result<(), PublishError> {
        self.run(&["config", "user.name", identity.name.as_str()]).await?;
        self.run(&["config", "user.email", identity.email.as_str()]).await?;
        Ok(())
    }

    async fn stage(&self, paths: &[PathBuf]) -> Result<(), PublishError> {
        let paths: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
        self.run_with_paths(&["add"], &paths).await?;
        Ok(())
    }

    async fn staged_changes(&self, scope: &Path) -> Result<Vec<String>, PublishError> {
        let out = self
            .run_with_paths(&["diff", "--cached", "--name-only"], &[scope])
            .await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect())
    }

    async fn commit(&self, message: &str, scope: &Path) -> Result<(), PublishError> {
        self.run_with_paths(&["commit", "-m", message], &[scope])
            .await?;
        Ok(())
    }

    async fn push(&self) -> Result<(), PublishError> {
        self.run(&["push", self.remote.as_str(), "HEAD"]).await?;
        Ok(())
    }
}
