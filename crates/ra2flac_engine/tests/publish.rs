use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use ra2flac_engine::{
    collect_artifacts, ArtifactStore, CommitIdentity, GitRepository, PublishError, PublishReport,
    PublishSettings, Publisher,
};
use tempfile::TempDir;

/// In-memory store: a staged file counts as changed until it has been committed once.
#[derive(Default)]
struct RecordingStore {
    calls: Mutex<Vec<String>>,
    staged: Mutex<Vec<PathBuf>>,
    committed: Mutex<Vec<PathBuf>>,
}

impl RecordingStore {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStore for RecordingStore {
    async fn configure_identity(&self, identity: &CommitIdentity) -> Result<(), PublishError> {
        self.calls.lock().unwrap().push(format!("identity {}", identity.name));
        Ok(())
    }

    async fn stage(&self, paths: &[PathBuf]) -> Result<(), PublishError> {
        self.calls.lock().unwrap().push(format!("stage {}", paths.len()));
        *self.staged.lock().unwrap() = paths.to_vec();
        Ok(())
    }

    async fn staged_changes(&self, _scope: &Path) -> Result<Vec<String>, PublishError> {
        let committed = self.committed.lock().unwrap();
        Ok(self
            .staged
            .lock()
            .unwrap()
            .iter()
            .filter(|path| !committed.contains(path))
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect())
    }

    async fn commit(&self, message: &str, _scope: &Path) -> Result<(), PublishError> {
        self.calls.lock().unwrap().push(format!("commit {message}"));
        let staged = self.staged.lock().unwrap().clone();
        self.committed.lock().unwrap().extend(staged);
        Ok(())
    }

    async fn push(&self) -> Result<(), PublishError> {
        self.calls.lock().unwrap().push("push".to_string());
        Ok(())
    }
}

fn write_flac(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), b"fLaC\0\0\0\x22").unwrap();
}

#[test]
fn only_matching_artifacts_are_collected() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("flac_files");
    write_flac(&dir, "b.flac");
    write_flac(&dir, "a.FLAC");
    fs::write(dir.join("notes.txt"), "x").unwrap();
    fs::write(dir.join(".partial-abc123"), "x").unwrap();

    let names: Vec<_> = collect_artifacts(&dir, "flac")
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.FLAC".to_string(), "b.flac".to_string()]);

    assert!(collect_artifacts(&temp.path().join("missing"), "flac")
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn no_artifacts_means_no_commit() {
    let temp = TempDir::new().unwrap();
    let store = RecordingStore::default();
    let publisher = Publisher::new(PublishSettings::new(temp.path().join("flac_files")));

    let report = publisher.publish(&store).await.unwrap();
    assert_eq!(report, PublishReport::NoChanges);
    assert_eq!(store.calls(), vec!["identity github-actions[bot]".to_string()]);
}

#[tokio::test]
async fn new_artifacts_produce_one_commit_and_push() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("flac_files");
    write_flac(&dir, "one.flac");
    write_flac(&dir, "two.flac");

    let store = RecordingStore::default();
    let publisher = Publisher::new(PublishSettings::new(dir));

    let report = publisher.publish(&store).await.unwrap();
    assert_eq!(
        report,
        PublishReport::Committed {
            files: vec!["one.flac".to_string(), "two.flac".to_string()],
            pushed: true,
        }
    );
    assert_eq!(
        store.calls(),
        vec![
            "identity github-actions[bot]".to_string(),
            "stage 2".to_string(),
            "commit Add converted FLAC files".to_string(),
            "push".to_string(),
        ]
    );

    // Nothing new on the second pass.
    let again = publisher.publish(&store).await.unwrap();
    assert_eq!(again, PublishReport::NoChanges);
    assert_eq!(
        store.calls().iter().filter(|c| c.starts_with("commit")).count(),
        1
    );
}

#[tokio::test]
async fn push_can_be_disabled() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("flac_files");
    write_flac(&dir, "one.flac");

    let store = RecordingStore::default();
    let settings = PublishSettings {
        push: false,
        ..PublishSettings::new(dir)
    };
    let report = Publisher::new(settings).publish(&store).await.unwrap();

    assert_eq!(
        report,
        PublishReport::Committed {
            files: vec!["one.flac".to_string()],
            pushed: false,
        }
    );
    assert!(!store.calls().contains(&"push".to_string()));
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn commit_count(dir: &Path) -> usize {
    git(dir, &["rev-list", "--count", "HEAD"]).trim().parse().unwrap()
}

#[tokio::test]
async fn git_repository_commits_and_pushes_once() {
    if which::which("git").is_err() {
        eprintln!("git not on PATH; skipping");
        return;
    }

    let temp = TempDir::new().unwrap();
    let remote = temp.path().join("remote.git");
    let work = temp.path().join("work");
    fs::create_dir_all(&remote).unwrap();
    git(&remote, &["init", "--bare", "--quiet"]);
    git(temp.path(), &["clone", "--quiet", remote.to_str().unwrap(), "work"]);
    git(&work, &["config", "user.name", "setup"]);
    git(&work, &["config", "user.email", "setup@example.com"]);
    git(&work, &["config", "commit.gpgsign", "false"]);
    fs::write(work.join("README"), "archive\n").unwrap();
    git(&work, &["add", "README"]);
    git(&work, &["commit", "--quiet", "-m", "init"]);
    git(&work, &["push", "--quiet", "origin", "HEAD"]);

    let dir = work.join("flac_files");
    write_flac(&dir, "a.flac");
    write_flac(&dir, "b.flac");
    write_flac(&dir, "c.flac");
    fs::write(dir.join("stray.txt"), "not an artifact").unwrap();

    let repo = GitRepository::open(&work).await.unwrap();
    let publisher = Publisher::new(PublishSettings::new(dir.clone()));

    let report = publisher.publish(&repo).await.unwrap();
    match report {
        PublishReport::Committed { files, pushed } => {
            assert_eq!(files.len(), 3);
            assert!(pushed);
        }
        other => panic!("expected a commit, got {other:?}"),
    }
    assert_eq!(commit_count(&work), 2);
    assert_eq!(
        git(&work, &["log", "-1", "--format=%an|%s"]).trim(),
        "github-actions[bot]|Add converted FLAC files"
    );
    assert_eq!(commit_count(&remote), 2);
    let tracked = git(&work, &["ls-files", "flac_files"]);
    assert!(!tracked.contains("stray.txt"));

    // Second run with identical inputs: no new commit.
    let again = publisher.publish(&repo).await.unwrap();
    assert_eq!(again, PublishReport::NoChanges);
    assert_eq!(commit_count(&work), 2);
}

#[tokio::test]
async fn opening_a_plain_directory_fails() {
    if which::which("git").is_err() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let err = GitRepository::open(temp.path()).await.unwrap_err();
    assert!(matches!(err, PublishError::NotARepository { .. }));
}
