use std::sync::LazyLock;

use regex::Regex;

/// Banner the host injects at the top of every page.
static BANNER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)voc[eê]\s+est[aá]\s+lendo").unwrap());
/// Metadata line of the banner block: `#` after optional indentation.
static MARKER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#.*$").unwrap());

const MARKER: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// "Você está lendo" banner followed by a run of `#` metadata lines.
    Banner,
    /// No banner phrase; the page may still lead with `#` lines.
    MarkerLines,
}

impl HeaderLayout {
    pub fn detect(text: &str) -> Self {
        if BANNER_RE.is_match(text) {
            HeaderLayout::Banner
        } else {
            HeaderLayout::MarkerLines
        }
    }
}

/// Remove the repeated site header from a page's extracted text.
pub fn strip_header(text: &str) -> String {
    match HeaderLayout::detect(text) {
        HeaderLayout::Banner => strip_banner(text),
        HeaderLayout::MarkerLines => strip_leading_marker_lines(text),
    }
}

/// Content starts right after the last `#` line; prose never opens with the marker.
fn strip_banner(text: &str) -> String {
    match MARKER_LINE_RE.find_iter(text).last() {
        Some(m) => text[m.end()..].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Blank lines between `#` paragraphs belong to the leading run.
fn strip_leading_marker_lines(text: &str) -> String {
    let mut offset = 0;
    let mut seen_marker = false;
    for line in text.split_inclusive('\n') {
        if line.contains(MARKER) {
            seen_marker = true;
        } else if !(seen_marker && line.trim().is_empty()) {
            break;
        }
        offset += line.len();
    }
    if !seen_marker {
        return text.to_string();
    }
    text[offset..].trim().to_string()
}
