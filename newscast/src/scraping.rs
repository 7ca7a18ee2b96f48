use scraper::{Html, Node};
use url::Url;

/// Default news search page, sorted by latest.
pub const DEFAULT_SEARCH_URL: &str = "https://news.google.com/search";

/// Builds the search URL for a topic, asking for newest results first.
pub fn news_search_url(base: &str, topic: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(base, &[("q", topic), ("tbs", "sbd:1")])
}

/// Extracts the visible text of an HTML page, one text node per line.
/// Script, style and noscript bodies are dropped.
pub fn clean_html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else { continue };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| matches!(e.name(), "script" | "style" | "noscript"))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    lines.join("\n")
}

/// Picks headlines out of cleaned search-page text.
///
/// Result cards end with a "More" line; the first line of each card is its
/// headline. A trailing card without the marker still contributes.
pub fn extract_headlines(cleaned_text: &str) -> String {
    let mut headlines = Vec::new();
    let mut current_block: Vec<&str> = Vec::new();

    for line in cleaned_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line == "More" {
            if let Some(first) = current_block.first() {
                headlines.push(*first);
            }
            current_block.clear();
        } else {
            current_block.push(line);
        }
    }

    if let Some(first) = current_block.first() {
        headlines.push(*first);
    }

    headlines.join("\n")
}
