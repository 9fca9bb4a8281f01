use sha2::{Digest, Sha256};
use url::Url;

const MAX_STEM_LEN: usize = 120;

/// Local filename for a downloaded source: the URL's last path segment, made filesystem safe.
///
/// Falls back to `untitled--{short_hash(url)}.ra` when the URL has no usable last segment.
pub fn source_filename(url: &str) -> String {
    let segment = last_segment(url)
        .map(|raw| match urlencoding::decode(&raw) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => raw.clone(),
        })
        .map(|decoded| sanitize(&decoded))
        .filter(|name| !name.is_empty());

    match segment {
        Some(name) => name,
        None => format!("untitled--{}.ra", short_hash(url)),
    }
}

/// `{stem}.flac` for a source filename.
pub fn flac_filename(source_filename: &str) -> String {
    let stem = match source_filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => source_filename,
    };
    format!("{stem}.flac")
}

fn last_segment(url: &str) -> Option<String> {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    }
}

fn sanitize(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();

    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    truncate_stem(&mut compacted);
    if let Some((stem, ext)) = compacted.rsplit_once('.') {
        if is_reserved_windows_name(stem) {
            return format!("{stem}_.{ext}");
        }
    } else if is_reserved_windows_name(&compacted) {
        compacted.push('_');
    }
    compacted
}

/// Caps the stem length while keeping the extension intact.
fn truncate_stem(name: &mut String) {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), Some(ext.to_string())),
        None => (name.clone(), None),
    };
    if stem.chars().count() <= MAX_STEM_LEN {
        return;
    }
    let short: String = stem.chars().take(MAX_STEM_LEN).collect();
    *name = match ext {
        Some(ext) => format!("{short}.{ext}"),
        None => short,
    };
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
