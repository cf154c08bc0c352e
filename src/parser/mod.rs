pub mod content;
pub mod header;

/// Two-pass pipeline: markup → paragraph text → text without the site banner.
pub fn process_page(markup: &str) -> String {
    let text = content::extract_content(markup);
    header::strip_header(&text)
}
