//! Command-line interface of `download_and_convert`.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "download_and_convert")]
#[command(about = "Download RealAudio (.ra) files and convert them to FLAC", long_about = None)]
pub struct Cli {
    /// Comma-separated .ra URLs to process instead of auto-discovery. Empty means auto-discover.
    #[arg(long, env = "MANUAL_URLS", default_value = "", allow_hyphen_values = true)]
    pub manual_urls: String,

    /// Optional RON settings file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Source page to scan during auto-discovery (repeatable; replaces the built-in list).
    #[arg(long = "source-page", value_name = "URL")]
    pub source_pages: Vec<String>,

    /// Directory for converted FLAC files [default: flac_files].
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory for downloaded .ra files awaiting conversion [default: ra_files].
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Root of the git work tree to publish into [default: .].
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Path to the ffmpeg executable (looked up on PATH otherwise).
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Commit new FLAC files and push them when the run finishes.
    #[arg(long)]
    pub publish: bool,

    /// Commit but do not push.
    #[arg(long, requires = "publish")]
    pub no_push: bool,

    /// Exit with status 2 if any individual download or conversion failed.
    #[arg(long)]
    pub strict: bool,

    /// Write a JSON run summary to this file.
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Also write the log to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_urls_default_to_empty() {
        let cli = Cli::try_parse_from(["download_and_convert"]).unwrap();
        assert_eq!(cli.manual_urls, "");
        assert!(!cli.publish);
        assert_eq!(cli.log_level(), LevelFilter::Info);
    }

    #[test]
    fn manual_urls_are_taken_verbatim() {
        let raw = "https://a.example/x.ra, https://b.example/y.ra,";
        let cli = Cli::try_parse_from(["download_and_convert", "--manual-urls", raw]).unwrap();
        assert_eq!(cli.manual_urls, raw);
    }

    #[test]
    fn explicit_empty_manual_urls_is_accepted() {
        let cli = Cli::try_parse_from(["download_and_convert", "--manual-urls", ""]).unwrap();
        assert_eq!(cli.manual_urls, "");
    }

    #[test]
    fn no_push_requires_publish() {
        assert!(Cli::try_parse_from(["download_and_convert", "--no-push"]).is_err());
        let cli =
            Cli::try_parse_from(["download_and_convert", "--publish", "--no-push", "-vv"]).unwrap();
        assert!(cli.no_push);
        assert_eq!(cli.log_level(), LevelFilter::Trace);
    }

    #[test]
    fn source_pages_are_repeatable() {
        let cli = Cli::try_parse_from([
            "download_and_convert",
            "--source-page",
            "https://a.example/1.html",
            "--source-page",
            "https://a.example/2.html",
        ])
        .unwrap();
        assert_eq!(cli.source_pages.len(), 2);
    }
}
