use engine_logging::engine_warn;
use thiserror::Error;

use crate::decode::decode_html;
use crate::fetch::Fetcher;
use crate::links::AudioLinkExtractor;
use crate::FetchError;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Fetches a source page and returns the audio links on it, resolved against
/// the page's final (post-redirect) URL.
///
/// Bytes that are invalid in the page's encoding are replaced, so the links
/// around them are still found.
pub async fn discover_links(
    fetcher: &dyn Fetcher,
    extractor: &AudioLinkExtractor,
    page_url: &str,
) -> Result<Vec<String>, DiscoveryError> {
    let output = fetcher.fetch(page_url).await?;
    let decoded = decode_html(&output.bytes, output.metadata.content_type.as_deref());
    if decoded.had_errors {
        engine_warn!(
            "[Warning] {} has bytes invalid in {}; decoded with replacements",
            page_url,
            decoded.encoding_label
        );
    }
    Ok(extractor.extract(&decoded.html, Some(&output.metadata.final_url)))
}
