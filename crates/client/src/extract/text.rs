//! Visible-text extraction from parsed HTML.
//!
//! Walks `<body>` in document order, skipping nodes that never render as
//! text (`script`, `style`, `noscript`, `template`, comments). Block-level
//! boundaries contribute a space so adjacent paragraphs stay separate words.

use std::sync::LazyLock;

use scraper::node::Text;
use scraper::{ElementRef, Html, Node, Selector};

use super::normalize::collapse_whitespace;

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("invalid selector"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("head > title").expect("invalid selector"));

/// Elements whose subtree is dropped entirely.
const SKIPPED: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that separate the text around them.
const BLOCK: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "caption", "dd", "details", "dialog", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "legend",
    "li", "main", "nav", "ol", "option", "p", "pre", "section", "summary", "table", "tbody", "td", "tfoot", "th",
    "thead", "tr", "ul",
];

/// Normalized text and title of an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub title: Option<String>,
    pub text: String,
}

enum Step<'a> {
    Visit(ElementRef<'a>),
    Text(&'a Text),
    Gap,
}

/// Parse `html` and return its visible body text plus `<title>`.
pub fn extract_visible_text(html: &str) -> PageText {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    // frameset documents have no body and no visible text of their own
    let text = document.select(&BODY).next().map(|body| collapse_whitespace(&visible_text(body))).unwrap_or_default();

    PageText { title, text }
}

/// Concatenate the visible text nodes under `root` without normalizing.
pub fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    let mut stack = vec![Step::Visit(root)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Text(text) => out.push_str(text),
            Step::Gap => out.push(' '),
            Step::Visit(element) => {
                if BLOCK.contains(&element.value().name()) {
                    out.push(' ');
                    stack.push(Step::Gap);
                }
                for child in element.children().rev() {
                    match child.value() {
                        Node::Text(text) => stack.push(Step::Text(text)),
                        Node::Element(el) if !SKIPPED.contains(&el.name()) => {
                            if let Some(child) = ElementRef::wrap(child) {
                                stack.push(Step::Visit(child));
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>  Test
                Article </title>
            <style>body { color: red; }</style>
            <script>var leaked = "head script";</script>
        </head>
        <body>
            <!-- a comment that should vanish -->
            <h1>Main Heading</h1>
            <p>This is a <b>test</b> paragraph.</p>
            <script type="text/javascript">document.write("<p>injected</p>");</script>
            <style>.x { display: none }</style>
            <noscript><img src="pixel.gif" alt="tracking"></noscript>
            <p>Another&nbsp;paragraph.</p>
        </body>
        </html>
    "#;

    #[test]
    fn test_extract_article() {
        let page = extract_visible_text(ARTICLE_HTML);
        assert_eq!(page.title.as_deref(), Some("Test Article"));
        assert_eq!(page.text, "Main Heading This is a test paragraph. Another paragraph.");
    }

    #[test]
    fn test_no_script_or_style_content() {
        let page = extract_visible_text(ARTICLE_HTML);
        assert!(!page.text.contains("leaked"));
        assert!(!page.text.contains("injected"));
        assert!(!page.text.contains("color"));
        assert!(!page.text.contains("display"));
        assert!(!page.text.contains("comment"));
    }

    #[test]
    fn test_no_tag_markup() {
        let page = extract_visible_text(ARTICLE_HTML);
        assert!(!page.text.contains('<'));
        assert!(!page.text.contains('>'));
    }

    #[test]
    fn test_whitespace_example() {
        let page = extract_visible_text("<p>Hello   \n\nWorld</p>");
        assert_eq!(page.text, "Hello World");
    }

    #[test]
    fn test_inline_elements_do_not_split_words() {
        let page = extract_visible_text("<p>un<em>believ</em>able</p>");
        assert_eq!(page.text, "unbelievable");
    }

    #[test]
    fn test_block_elements_separate_words() {
        let page = extract_visible_text("<div>one</div><div>two</div><p>three<br>four</p>");
        assert_eq!(page.text, "one two three four");
    }

    #[test]
    fn test_list_and_table() {
        let html = "<ul><li>a</li><li>b</li></ul><table><tr><td>c</td><td>d</td></tr></table>";
        assert_eq!(extract_visible_text(html).text, "a b c d");
    }

    #[test]
    fn test_entities_decoded() {
        let page = extract_visible_text("<p>Fish &amp; Chips &lt;3</p>");
        assert_eq!(page.text, "Fish & Chips <3");
    }

    #[test]
    fn test_template_skipped() {
        let page = extract_visible_text("<p>shown</p><template><p>hidden</p></template>");
        assert_eq!(page.text, "shown");
    }

    #[test]
    fn test_no_title() {
        let page = extract_visible_text("<p>body only</p>");
        assert_eq!(page.title, None);
        assert_eq!(page.text, "body only");
    }

    #[test]
    fn test_empty_document() {
        let page = extract_visible_text("");
        assert_eq!(page.text, "");
        assert_eq!(page.title, None);
    }

    #[test]
    fn test_title_excluded_from_body_text() {
        let page = extract_visible_text("<html><head><title>Heading</title></head><body>Body</body></html>");
        assert_eq!(page.text, "Body");
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 5_000;
        let html = format!("{}deep{}", "<span>".repeat(depth), "</span>".repeat(depth));
        let page = extract_visible_text(&html);
        assert_eq!(page.text, "deep");
    }

    #[test]
    fn test_frameset_has_no_text() {
        let html = r#"<html><head><title>T</title></head><frameset><frame src="a.html"></frameset></html>"#;
        let page = extract_visible_text(html);
        assert_eq!(page.title.as_deref(), Some("T"));
        assert_eq!(page.text, "");
    }

    #[test]
    fn test_svg_title_is_not_page_title() {
        let html = "<html><head></head><body><svg><title>icon label</title></svg><p>text</p></body></html>";
        let page = extract_visible_text(html);
        assert_eq!(page.title, None);
    }

    #[test]
    fn test_head_title_wins_over_svg_title() {
        let html = "<html><head><title>Page</title></head><body><svg><title>icon</title></svg></body></html>";
        assert_eq!(extract_visible_text(html).title.as_deref(), Some("Page"));
    }
}
