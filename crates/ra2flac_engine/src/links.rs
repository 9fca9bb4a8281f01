use scraper::{Html, Selector};
use url::Url;

const DEFAULT_MAX_LINKS: usize = 5_000;

/// Collects absolute URLs of anchors whose href ends in one of the given extensions.
#[derive(Debug, Clone)]
pub struct AudioLinkExtractor {
    extensions: Vec<String>,
    max_links: usize,
}

impl AudioLinkExtractor {
    /// Extractor for RealAudio (`.ra`) links.
    pub fn new() -> Self {
        Self::with_extensions(["ra"])
    }

    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| format!(".{}", ext.as_ref().trim_start_matches('.').to_ascii_lowercase()))
                .collect(),
            max_links: DEFAULT_MAX_LINKS,
        }
    }

    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    /// Returns matching links in document order. Duplicates are kept; callers dedupe.
    pub fn extract(&self, html: &str, base_url: Option<&str>) -> Vec<String> {
        let document = Html::parse_document(html);
        let base_url = base_url.and_then(|b| Url::parse(b).ok());
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|anchor| anchor.value().attr("href"))
            .map(str::trim)
            .filter(|href| self.matches_extension(href))
            .filter_map(|href| resolve_url(href, base_url.as_ref()))
            .map(String::from)
            .take(self.max_links)
            .collect()
    }

    fn matches_extension(&self, href: &str) -> bool {
        let lower = href.to_ascii_lowercase();
        self.extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
    }
}

impl Default for AudioLinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_url(reference: &str, base: Option<&Url>) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with('?') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.and_then(|base| base.join(trimmed).ok())
}
