use std::path::PathBuf;

use crate::fetch::FetchSettings;
use crate::publish::PublishSettings;

/// Archived pages scanned for `.ra` links when no manual list is given.
pub const DEFAULT_SOURCE_PAGES: &[&str] = &[
    "https://web.archive.org/web/19970807015220/http://www.mahoroba.or.jp/~nakagami/music/newsound.html",
    "https://web.archive.org/web/19970807015236/http://www.mahoroba.or.jp/~nakagami/music/sndarc.html",
    "https://web.archive.org/web/19970807011832/http://www.mahoroba.or.jp/~nakagami/music/cd.html",
];

pub const DEFAULT_OUTPUT_DIR: &str = "flac_files";
pub const DEFAULT_STAGING_DIR: &str = "ra_files";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_pages: Vec<String>,
    /// Where converted FLAC files land.
    pub output_dir: PathBuf,
    /// Where downloaded sources wait for conversion.
    pub staging_dir: PathBuf,
    pub repo_root: PathBuf,
    pub page_fetch: FetchSettings,
    pub download_fetch: FetchSettings,
    /// Explicit media tool; `None` looks `ffmpeg` up on `PATH`.
    pub ffmpeg: Option<PathBuf>,
    pub publish_enabled: bool,
    pub publish: PublishSettings,
}

impl PipelineConfig {
    /// Defaults with every directory placed under `root`.
    pub fn default_with_root(root: PathBuf) -> Self {
        let output_dir = root.join(DEFAULT_OUTPUT_DIR);
        Self {
            source_pages: DEFAULT_SOURCE_PAGES.iter().map(|s| s.to_string()).collect(),
            staging_dir: root.join(DEFAULT_STAGING_DIR),
            publish: PublishSettings::new(output_dir.clone()),
            output_dir,
            repo_root: root,
            page_fetch: FetchSettings::for_pages(),
            download_fetch: FetchSettings::for_downloads(),
            ffmpeg: None,
            publish_enabled: false,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::default_with_root(PathBuf::from("."))
    }
}
