//! Snapshot-side document queries.
//!
//! Every extraction stage works on a `scraper::Html` snapshot of the live page.
//! The helpers here give those snapshots the shape the browser would report:
//! `inner_text` mirrors `HTMLElement.innerText` line structure and the
//! `ElementTarget` ordinals line up with `document.querySelectorAll`.

use scraper::node::Node;
use scraper::{ElementRef, Selector};
use tracing::debug;

const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "tfoot",
    "thead",
    "tr",
    "ul",
];

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Parse a CSS selector, logging instead of failing on bad input.
pub fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            debug!("invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

/// Rendered text of an element with block boundaries kept as line breaks.
///
/// Runs of whitespace collapse to one space, lines are trimmed and blank
/// lines dropped, as `innerText` does for normal-flow content.
pub fn inner_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
            }
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push('\n');
                } else if name == "td" || name == "th" {
                    out.push(' ');
                }
                collect_text(child_ref, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Trimmed rendered text of the first element matching `css` under `root`.
pub fn first_text(root: ElementRef<'_>, css: &str) -> Option<String> {
    let selector = parse_selector(css)?;
    root.select(&selector)
        .map(inner_text)
        .find(|t| !t.is_empty())
}

/// Text of the first match, falling back to the listed attributes when the
/// element renders nothing (e.g. `<meta itemprop=... content=...>`).
pub fn first_text_or_attr(root: ElementRef<'_>, css: &str, attrs: &[&str]) -> Option<String> {
    let selector = parse_selector(css)?;
    root.select(&selector).find_map(|el| {
        let text = inner_text(el);
        if !text.is_empty() {
            return Some(text);
        }
        attrs
            .iter()
            .filter_map(|a| el.value().attr(a))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    })
}

/// Rendered text of every match, in document order, blanks dropped.
pub fn all_texts(root: ElementRef<'_>, css: &str) -> Vec<String> {
    let Some(selector) = parse_selector(css) else {
        return Vec::new();
    };
    root.select(&selector)
        .map(inner_text)
        .filter(|t| !t.is_empty())
        .collect()
}

/// First non-empty value of `attr` across elements matching `css`.
pub fn first_attr(root: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    let selector = parse_selector(css)?;
    root.select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Nearest ancestor (excluding `element`) whose tag is one of `tags`.
pub fn closest<'a>(element: ElementRef<'a>, tags: &[&str]) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| tags.contains(&el.value().name()))
}

/// True when `element` or one of its ancestors carries a class containing any of `fragments`.
pub fn within_class(element: ElementRef<'_>, fragments: &[&str]) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| {
            el.value().attr("class").is_some_and(|class| {
                let class = class.to_ascii_lowercase();
                fragments.iter().any(|f| class.contains(f))
            })
        })
}

pub fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}
