/// The `manual_urls` trigger input.
///
/// The raw string is kept byte-for-byte so it can be handed on unmodified; the
/// parsed view splits on commas and drops blank entries. No URL validation
/// happens at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManualUrls {
    raw: String,
}

impl ManualUrls {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn urls(&self) -> Vec<String> {
        self.raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// True when there is nothing to retry and the run should discover sources itself.
    pub fn is_auto_discover(&self) -> bool {
        self.urls().is_empty()
    }
}
