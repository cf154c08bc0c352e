use std::sync::LazyLock;

use scraper::{Html, Selector};

static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());

/// Paragraph text of a page, in document order, one blank line between paragraphs.
///
/// The host wraps every prose line in a `<p>`, so nothing else is selected.
pub fn extract_content(markup: &str) -> String {
    let doc = Html::parse_document(markup);
    doc.select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}
