//! Readable-content extraction and HTML stripping shared by every worker
//!. Not a full Readability port — a pragmatic "take the
//! longest block of paragraph text" heuristic, good enough for a briefing
//! summary to work from.

use scraper::{Html, Selector};

/// Strip HTML tags from a feed-provided description/content field,
/// collapsing whitespace.
pub fn strip_html(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Extract the main readable text from a full HTML document: prefer an
/// `<article>` element, falling back to `<main>`, falling back to the
/// concatenation of all `<p>` text. Returns `None` if nothing usable was
/// found.
pub fn extract_readable_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for selector_str in ["article", "main"] {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(el) = document.select(&selector).next() {
                let text = collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "));
                if text.len() > 200 {
                    return Some(text);
                }
            }
        }
    }

    let p_selector = Selector::parse("p").ok()?;
    let paragraphs: Vec<String> = document
        .select(&p_selector)
        .map(|p| collapse_whitespace(&p.text().collect::<Vec<_>>().join(" ")))
        .filter(|t| t.len() > 40)
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_removes_tags_and_collapses_whitespace() {
        let input = "<p>Hello   <b>world</b></p>\n<p>again</p>";
        assert_eq!(strip_html(input), "Hello world again");
    }

    #[test]
    fn extract_readable_text_prefers_article_element() {
        let html = "<html><body><article><p>This is the real article content that matters a great deal and is long enough to pass the length check we apply.</p></article><p>nav junk</p></body></html>";
        let text = extract_readable_text(html).unwrap();
        assert!(text.contains("real article content"));
    }

    #[test]
    fn extract_readable_text_falls_back_to_paragraphs() {
        let html = "<html><body><div><p>First paragraph with enough length to pass the forty character floor we use here.</p><p>Second paragraph, also long enough to pass the same floor comfortably.</p></div></body></html>";
        let text = extract_readable_text(html).unwrap();
        assert!(text.contains("First paragraph"));
        assert!(text.contains("Second paragraph"));
    }

    #[test]
    fn extract_readable_text_none_when_nothing_substantial() {
        assert!(extract_readable_text("<html><body><p>hi</p></body></html>").is_none());
    }
}
