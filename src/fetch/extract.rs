//! Title and text extraction from fetched bodies

use scraper::{ElementRef, Html, Selector};

use super::FetchedPage;
use crate::utils::collapse_whitespace;

/// Elements whose text never belongs in the extracted body
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "nav", "header", "footer", "aside",
];

/// Candidate containers for the main content, most specific first
const CONTENT_SELECTORS: &[&str] = &["main", "article", "[role=\"main\"]", "#main-content", "body"];

/// Extract the page title and visible main-content text from HTML
pub fn extract_html(html: &str) -> FetchedPage {
    let document = Html::parse_document(html);

    let title = first_text(&document, "title")
        .or_else(|| first_text(&document, "h1"))
        .filter(|t| !t.is_empty());

    let mut content = String::new();
    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            content = visible_text(element);
            if !content.is_empty() {
                break;
            }
        }
    }
    if content.is_empty() {
        content = visible_text(document.root_element());
    }

    FetchedPage { title, content }
}

/// Plain-text or markdown bodies: the first markdown heading is the title
pub fn extract_text(text: &str) -> FetchedPage {
    let title = text
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with('#'))
        .map(|l| l.trim_start_matches('#').trim().to_string())
        .filter(|t| !t.is_empty());

    FetchedPage {
        title,
        content: collapse_whitespace(text),
    }
}

fn first_text(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| SKIP_TAGS.contains(&el.name()))
                .unwrap_or(false)
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_html_prefers_main() {
        let html = r#"<html><head><title>Getting Started | Docs</title>
            <script>var tracking = 1;</script></head>
            <body><nav>Home Docs Blog</nav>
            <main><h1>Getting Started</h1><p>Install the   CLI.</p>
            <script>ignored()</script><p>Then run it.</p></main>
            <footer>Copyright</footer></body></html>"#;
        let page = extract_html(html);
        assert_eq!(page.title.as_deref(), Some("Getting Started | Docs"));
        assert_eq!(page.content, "Getting Started Install the CLI. Then run it.");
    }

    #[test]
    fn test_extract_html_falls_back_to_body_and_h1() {
        let html = "<html><body><nav>menu</nav><h1>Quotas</h1><div>Limit is 10.</div></body></html>";
        let page = extract_html(html);
        assert_eq!(page.title.as_deref(), Some("Quotas"));
        assert_eq!(page.content, "Quotas Limit is 10.");
    }

    #[test]
    fn test_extract_html_empty() {
        let page = extract_html("<html><body><script>x()</script></body></html>");
        assert!(page.content.is_empty());
        assert!(page.title.is_none());
    }

    #[test]
    fn test_extract_text_markdown() {
        let page = extract_text("Intro line\n\n# Runtime Guide\n\nSome   text\n");
        assert_eq!(page.title.as_deref(), Some("Runtime Guide"));
        assert_eq!(page.content, "Intro line # Runtime Guide Some text");
    }
}
