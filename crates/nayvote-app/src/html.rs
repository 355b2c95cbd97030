//! HTML to plain text for referendum bodies.

use regex::Regex;
use scraper::{Html, Node};

/// Elements whose text is never shown to a reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style"];

/// Converts proposal HTML into a single line of plain text.
///
/// Only text nodes are kept, so comments and attribute values never reach
/// the classifier. Entities are decoded by the parser.
#[derive(Debug, Clone)]
pub struct HtmlToText {
    whitespace: Regex,
}

impl HtmlToText {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Joins the trimmed text nodes with single spaces.
    pub fn convert(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return String::new();
        }

        let fragment = Html::parse_fragment(html);
        let mut parts = Vec::new();
        for node in fragment.root_element().descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
            });
            if !hidden {
                parts.push(text);
            }
        }

        self.whitespace
            .replace_all(&parts.join(" "), " ")
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html() -> HtmlToText {
        HtmlToText::new().unwrap()
    }

    // === Markup ===

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let text = html().convert("<p>Please   reject</p>\n<p>this <b>proposal</b></p>");
        assert_eq!(text, "Please reject this proposal");
    }

    #[test]
    fn drops_script_and_style_blocks() {
        let text = html().convert("<style>p { color: red }</style><p>Hi</p><script>alert(1)</script>");
        assert_eq!(text, "Hi");
    }

    #[test]
    fn comments_are_dropped_even_with_angle_brackets() {
        let text = html().convert("<!-- draft > please vote nay --><p>Hi</p>");
        assert_eq!(text, "Hi");
    }

    #[test]
    fn attribute_values_never_leak() {
        assert_eq!(html().convert("<img alt=\"x > y\"><p>Hi</p>"), "Hi");
        assert_eq!(
            html().convert("<a title=\"vote nay\" href=\"/r/1\">Details</a>"),
            "Details"
        );
    }

    // === Entities ===

    #[test]
    fn decodes_entities() {
        let text = html().convert("Fish &amp; chips &lt;3 &#39;ok&#39; &#x41;&nbsp;B");
        assert_eq!(text, "Fish & chips <3 'ok' A B");
    }

    #[test]
    fn decodes_named_entities() {
        assert_eq!(html().convert("a &copy; b"), "a \u{a9} b");
        assert_eq!(
            html().convert("<p>We don&rsquo;t support this&hellip;</p>"),
            "We don\u{2019}t support this\u{2026}"
        );
    }

    #[test]
    fn escaped_ampersand_is_decoded_once() {
        assert_eq!(html().convert("&amp;lt;"), "&lt;");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(html().convert(""), "");
        assert_eq!(html().convert("   "), "");
        assert_eq!(html().convert("<p> </p><!-- note -->"), "");
    }
}
