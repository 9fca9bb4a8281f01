//! `download_and_convert`: finds RealAudio files, converts them to FLAC and publishes the results.
pub mod cli;
pub mod report;
pub mod runner;
pub mod settings;

use std::sync::Arc;

use anyhow::{Context, Result};
use engine_logging::{engine_info, engine_warn};
use ra2flac_core::ManualUrls;
use ra2flac_engine::{ArtifactStore, Engine, FfmpegTranscoder, GitRepository};

pub use cli::Cli;
pub use runner::EffectRunner;

/// Runs one pipeline invocation and returns the process exit code.
///
/// Errors returned here are fatal (missing media tool, unusable directories,
/// bad settings, not a git work tree) and happen before any job starts.
pub async fn run(cli: &Cli) -> Result<i32> {
    let file = match &cli.config {
        Some(path) => settings::load_settings(path)?,
        None => settings::FileSettings::default(),
    };
    let config = settings::build_config(cli, &file);

    let transcoder = match &config.ffmpeg {
        Some(path) => FfmpegTranscoder::locate(path.as_os_str()),
        None => FfmpegTranscoder::from_path(),
    }
    .context("media conversion tool unavailable")?;
    match transcoder.version().await {
        Ok(version) => engine_info!("Using {} ({})", transcoder.binary_path().display(), version),
        Err(err) => engine_warn!("Could not query media tool version: {}", err),
    }

    let store: Option<Arc<dyn ArtifactStore>> = if config.publish_enabled {
        let repo = GitRepository::open(&config.repo_root)
            .await
            .context("cannot publish")?;
        Some(Arc::new(repo))
    } else {
        None
    };

    let engine = Engine::new(config, Arc::new(transcoder));
    engine
        .prepare_dirs()
        .context("cannot prepare staging/output directories")?;

    let mut runner = EffectRunner::new(engine, store);
    let summary = runner.run(ManualUrls::new(cli.manual_urls.clone())).await;

    report::log_summary(&summary);
    if let Some(path) = &cli.summary {
        report::write_summary(path, &summary, &cli.manual_urls)?;
    }
    Ok(report::exit_code(&summary, cli.strict))
}
