//! Text and markup helpers
//!
//! `visible_text` approximates `HTMLElement.innerText` over a snapshot:
//! non-rendered subtrees are skipped, inline whitespace collapses and block
//! boundaries become line breaks.

use super::layout::{HIDDEN_ATTR, STAMP_PREFIX};
use regex::Regex;
use scraper::{ElementRef, Node};
use std::sync::LazyLock;

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("BUG: invalid whitespace regex"));

static BLANK_LINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("BUG: invalid blank line regex"));

/// Elements whose content is never rendered as text
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "svg", "iframe", "object",
];

/// Elements that start on a new line
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "pre", "section", "table", "tr", "ul",
];

/// Table cells, separated from their neighbours by a space
const CELL_TAGS: &[&str] = &["td", "th"];

/// Elements without closing tags
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Rendered text of an element, whitespace-normalized
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    normalize_whitespace(&raw)
}

/// Character length of [`visible_text`]
pub fn visible_len(element: ElementRef<'_>) -> usize {
    visible_text(element).chars().count()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_collapsed(out, text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) || el.attr(HIDDEN_ATTR).is_some() {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let breaks = if name == "p" {
                    2
                } else if BLOCK_TAGS.contains(&name) {
                    1
                } else {
                    0
                };
                let cell = CELL_TAGS.contains(&name);
                push_breaks(out, breaks);
                if cell {
                    push_collapsed(out, " ");
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
                if cell {
                    push_collapsed(out, " ");
                }
                push_breaks(out, breaks);
            }
            _ => {}
        }
    }
}

// Adjacent block boundaries share their line breaks.
fn push_breaks(out: &mut String, wanted: usize) {
    if out.is_empty() {
        return;
    }
    let present = out.chars().rev().take_while(|c| *c == '\n').count();
    for _ in present..wanted {
        out.push('\n');
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !out.is_empty() && !out.ends_with([' ', '\n']) {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

/// Collapse whitespace inside lines, trim lines, keep at most one blank
/// line between paragraphs and trim the result.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = HORIZONTAL_WS.replace_all(text, " ");
    let lines: Vec<&str> = collapsed.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    BLANK_LINE_RUN.replace_all(&joined, "\n\n").trim().to_string()
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Inner markup of an element with scripts, styles, inline event handlers
/// and layout stamps removed.
pub fn clean_inner_html(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    write_children(element, &mut out);
    out
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&htmlescape::encode_minimal(text)),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_element(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let el = element.value();
    let name = el.name();
    if name == "script" || name == "style" {
        return;
    }
    out.push('<');
    out.push_str(name);
    for (attr, value) in el.attrs() {
        let lower = attr.to_ascii_lowercase();
        if lower.starts_with("on") || lower.starts_with(STAMP_PREFIX) {
            continue;
        }
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&htmlescape::encode_minimal(value));
        out.push('"');
    }
    out.push('>');
    if VOID_TAGS.contains(&name) {
        return;
    }
    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use pretty_assertions::assert_eq;

    fn text_of(html: &str, selector: &str) -> String {
        let doc = Document::from_html(html);
        visible_text(doc.select_first(selector).unwrap().unwrap())
    }

    #[test]
    fn test_visible_text_skips_scripts_and_hidden() {
        let text = text_of(
            r#"<div id="x">Hello <script>evil()</script><span data-pl-hidden="1">secret</span><b>world</b></div>"#,
            "#x",
        );
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_visible_text_block_breaks() {
        let text = text_of(
            "<div id='x'><p>First\n   paragraph</p><p>Second</p><ul><li>a</li><li>b</li></ul></div>",
            "#x",
        );
        assert_eq!(text, "First paragraph\n\nSecond\n\na\nb");
    }

    #[test]
    fn test_visible_text_separates_table_cells() {
        let text = text_of(
            "<table id='t'><tr><td>alpha</td><td>beta</td></tr><tr><th>gamma</th><th>delta</th></tr></table>",
            "#t",
        );
        assert_eq!(text, "alpha beta\ngamma delta");
    }

    #[test]
    fn test_normalize_whitespace() {
        let input = "  a \t b  \n\n\n\n  c\r\n d  ";
        assert_eq!(normalize_whitespace(input), "a b\n\nc\nd");
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("小红书笔记", 3), "小红书");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_clean_inner_html() {
        let doc = Document::from_html(
            r#"<div id="x"><p onclick="steal()" class="a" data-pl-hidden="1">Hi &amp; bye</p><script>x()</script><style>p{}</style><img src="a.png" onerror="y()"></div>"#,
        );
        let html = clean_inner_html(doc.select_first("#x").unwrap().unwrap());
        assert_eq!(html, r#"<p class="a">Hi &amp; bye</p><img src="a.png">"#);
    }
}
