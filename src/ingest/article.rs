//! Article text extraction from HTML pages.

use soup::prelude::*;

/// Elements whose text is never part of an article.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Extract the text of the article container `div#{container_id}`.
///
/// Descendant `div`s carrying any of `excluded_classes` are dropped. Text
/// segments are trimmed and joined with newlines; blank segments are
/// skipped. Returns None when the container is missing.
pub fn extract_article(
    html: &str,
    container_id: &str,
    excluded_classes: &[String],
) -> Option<String> {
    let soup = Soup::new(html);
    let container = soup.tag("div").attr("id", container_id.to_string()).find()?;

    let mut segments = Vec::new();
    collect_text(&container, excluded_classes, &mut segments);
    Some(segments.join("\n"))
}

/// Plain text of an HTML fragment with whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return collapse_whitespace(html);
    }
    let soup = Soup::new(html);
    let mut segments = Vec::new();
    collect_text(&soup.get_handle(), &[], &mut segments);
    collapse_whitespace(&segments.join(" "))
}

fn collect_text<N>(node: &N, excluded_classes: &[String], out: &mut Vec<String>)
where
    N: NodeExt + QueryBuilderExt,
{
    for child in node.children() {
        if child.is_text() {
            let text = child.text();
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        } else if child.is_element() {
            let name = child.name();
            if SKIPPED_ELEMENTS.contains(&name) {
                continue;
            }
            if name == "div" && has_excluded_class(&child, excluded_classes) {
                continue;
            }
            collect_text(&child, excluded_classes, out);
        }
    }
}

fn has_excluded_class<N: NodeExt>(node: &N, excluded_classes: &[String]) -> bool {
    node.get("class")
        .map(|classes| {
            classes
                .split_whitespace()
                .any(|c| excluded_classes.iter().any(|x| x == c))
        })
        .unwrap_or(false)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluded() -> Vec<String> {
        vec!["dog_two".to_string(), "separator".to_string()]
    }

    #[test]
    fn test_extract_article() {
        let html = r#"<html><body>
            <div id="header">Menu</div>
            <div id="articlebody">
              <p>First paragraph.</p>
              <div class="dog_two">Advertisement</div>
              <p>  Second <b>bold</b> line. </p>
              <div class="separator big"><img src="x.png"/>Caption</div>
              <script>var x = 1;</script>
              <p>   </p>
            </div>
        </body></html>"#;

        let text = extract_article(html, "articlebody", &excluded()).unwrap();
        assert_eq!(text, "First paragraph.\nSecond\nbold\nline.");
    }

    #[test]
    fn test_missing_container() {
        let html = "<html><body><div id=\"other\">text</div></body></html>";
        assert!(extract_article(html, "articlebody", &excluded()).is_none());
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(html_to_text("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(html_to_text("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(html_to_text("  plain\n text  "), "plain text");
        assert_eq!(html_to_text(""), "");
    }
}
