//! Optional RON settings file, merged under the command line.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use engine_logging::engine_info;
use ra2flac_engine::{PipelineConfig, DEFAULT_OUTPUT_DIR, DEFAULT_STAGING_DIR};
use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Every field is optional; anything left out keeps its built-in default.
///
/// ```ron
/// (
///     source_pages: ["https://example.org/music.html"],
///     output_dir: "flac_files",
///     download_timeout_secs: 30,
///     commit_message: "Add converted FLAC files",
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub source_pages: Option<Vec<String>>,
    pub output_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub repo_root: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
    pub page_timeout_secs: Option<u64>,
    pub download_timeout_secs: Option<u64>,
    pub max_download_bytes: Option<u64>,
    pub commit_name: Option<String>,
    pub commit_email: Option<String>,
    pub commit_message: Option<String>,
    pub push: Option<bool>,
}

pub fn parse_settings(text: &str) -> Result<FileSettings> {
    let options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
    options
        .from_str(text)
        .context("settings file is not valid RON")
}

pub fn load_settings(path: &Path) -> Result<FileSettings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings from {}", path.display()))?;
    let settings = parse_settings(&text)
        .with_context(|| format!("failed to parse settings from {}", path.display()))?;
    engine_info!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Built-in defaults, overlaid by the settings file, overlaid by the command line.
pub fn build_config(cli: &Cli, file: &FileSettings) -> PipelineConfig {
    let root = cli
        .repo
        .clone()
        .or_else(|| file.repo_root.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let mut config = PipelineConfig::default_with_root(root.clone());

    if !cli.source_pages.is_empty() {
        config.source_pages = cli.source_pages.clone();
    } else if let Some(pages) = &file.source_pages {
        config.source_pages = pages.clone();
    }

    config.output_dir = cli
        .output_dir
        .clone()
        .or_else(|| file.output_dir.clone())
        .unwrap_or_else(|| root.join(DEFAULT_OUTPUT_DIR));
    config.staging_dir = cli
        .staging_dir
        .clone()
        .or_else(|| file.staging_dir.clone())
        .unwrap_or_else(|| root.join(DEFAULT_STAGING_DIR));
    config.ffmpeg = cli.ffmpeg.clone().or_else(|| file.ffmpeg.clone());

    if let Some(secs) = file.page_timeout_secs {
        config.page_fetch.request_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.download_timeout_secs {
        config.download_fetch.request_timeout = Duration::from_secs(secs);
    }
    if let Some(max) = file.max_download_bytes {
        config.download_fetch.max_bytes = max;
    }

    config.publish_enabled = cli.publish;
    config.publish.artifact_dir = config.output_dir.clone();
    if let Some(name) = &file.commit_name {
        config.publish.identity.name = name.clone();
    }
    if let Some(email) = &file.commit_email {
        config.publish.identity.email = email.clone();
    }
    if let Some(message) = &file.commit_message {
        config.publish.message = message.clone();
    }
    config.publish.push = !cli.no_push && file.push.unwrap_or(true);

    config
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use ra2flac_engine::{DEFAULT_COMMIT_MESSAGE, DEFAULT_SOURCE_PAGES};

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["download_and_convert"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn defaults_match_the_published_layout() {
        let config = build_config(&cli(&[]), &FileSettings::default());
        assert_eq!(config.output_dir, PathBuf::from(".").join("flac_files"));
        assert_eq!(config.staging_dir, PathBuf::from(".").join("ra_files"));
        assert_eq!(config.source_pages.len(), DEFAULT_SOURCE_PAGES.len());
        assert_eq!(config.publish.message, DEFAULT_COMMIT_MESSAGE);
        assert_eq!(config.publish.identity.name, "github-actions[bot]");
        assert!(!config.publish_enabled);
        assert!(config.publish.push);
    }

    #[test]
    fn ron_fields_are_optional() {
        let settings = parse_settings(
            r#"(
                output_dir: "out",
                download_timeout_secs: 30,
                commit_name: "archiver",
                push: false,
            )"#,
        )
        .unwrap();
        assert_eq!(settings.output_dir, Some(PathBuf::from("out")));
        assert_eq!(settings.download_timeout_secs, Some(30));
        assert_eq!(settings.staging_dir, None);

        let config = build_config(&cli(&["--publish"]), &settings);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.publish.artifact_dir, PathBuf::from("out"));
        assert_eq!(config.download_fetch.request_timeout, Duration::from_secs(30));
        assert_eq!(config.publish.identity.name, "archiver");
        assert!(config.publish_enabled);
        assert!(!config.publish.push);
    }

    #[test]
    fn command_line_wins_over_file() {
        let settings = FileSettings {
            output_dir: Some(PathBuf::from("from-file")),
            source_pages: Some(vec!["https://file.example/".to_string()]),
            ..FileSettings::default()
        };
        let config = build_config(
            &cli(&[
                "--output-dir",
                "from-cli",
                "--source-page",
                "https://cli.example/",
            ]),
            &settings,
        );
        assert_eq!(config.output_dir, PathBuf::from("from-cli"));
        assert_eq!(config.source_pages, vec!["https://cli.example/".to_string()]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(parse_settings("(output_directory: \"x\")").is_err());
    }
}
