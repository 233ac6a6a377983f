//! Allow-list sanitization of the element tree.
//!
//! Runs after parsing and before decoration. Tags outside the allow-list are
//! unwrapped (their children survive) except for script-like containers,
//! which are removed together with their content. Attributes are filtered per
//! tag and their values validated.

use crate::render::tree::{Element, Node};
use once_cell::sync::Lazy;
use regex::Regex;

const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "blockquote", "hr", "em", "strong", "b", "i", "u", "s", "del", "code", "pre",
    "ul", "ol", "li", "table", "thead", "tbody", "tr", "th", "td", "h1", "h2", "h3", "h4",
    "h5", "h6", "a",
];

/// Dropped along with everything inside them.
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "textarea",
    "title", "svg", "math", "frame", "frameset", "applet",
];

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

static LANG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{1,8}(?:-[A-Za-z0-9]{1,8})*$").expect("lang pattern is valid")
});

static TEXT_ALIGN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*text-align\s*:\s*(left|right|center)\s*;?\s*$")
        .expect("text-align pattern is valid")
});

static LANGUAGE_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^language-[A-Za-z0-9_+#.\-]+$").expect("language class pattern is valid")
});

/// Filter a forest against the allow-list.
pub fn sanitize(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        sanitize_node(node, &mut out);
    }
    out
}

fn sanitize_node(node: Node, out: &mut Vec<Node>) {
    let element = match node {
        Node::Text(text) => {
            push_text(out, text);
            return;
        }
        Node::Element(element) => element,
    };

    let tag = element.tag.to_ascii_lowercase();
    if DROPPED_TAGS.contains(&tag.as_str()) {
        tracing::debug!(tag = %tag, "dropping disallowed element with its content");
        return;
    }

    let children = sanitize(element.children);
    if !ALLOWED_TAGS.contains(&tag.as_str()) {
        for child in children {
            match child {
                Node::Text(text) => push_text(out, text),
                other => out.push(other),
            }
        }
        return;
    }

    let attrs = element
        .attrs
        .into_iter()
        .filter_map(|(name, value)| {
            let name = name.to_ascii_lowercase();
            let value = allowed_attr(&tag, &name, &value)?;
            Some((name, value))
        })
        .collect();

    out.push(Node::Element(Element {
        tag,
        attrs,
        children,
    }));
}

fn push_text(out: &mut Vec<Node>, text: String) {
    if let Some(Node::Text(last)) = out.last_mut() {
        last.push_str(&text);
    } else {
        out.push(Node::Text(text));
    }
}

/// The value to keep for `name` on `tag`, or `None` to drop it.
fn allowed_attr(tag: &str, name: &str, value: &str) -> Option<String> {
    match (tag, name) {
        (_, "dir") => {
            let value = value.trim().to_ascii_lowercase();
            matches!(value.as_str(), "rtl" | "ltr" | "auto").then_some(value)
        }
        (_, "lang") => LANG_RE.is_match(value.trim()).then(|| value.trim().to_string()),
        ("a", "href") => safe_href(value).map(str::to_string),
        ("a", "target" | "rel") => Some(value.to_string()),
        ("th" | "td", "style") => TEXT_ALIGN_RE
            .captures(value)
            .map(|caps| format!("text-align:{}", caps[1].to_ascii_lowercase())),
        ("code", "class") => value
            .split_whitespace()
            .find(|class| LANGUAGE_CLASS_RE.is_match(class))
            .map(str::to_string),
        ("ol", "start") => {
            let value = value.trim();
            value.parse::<u32>().ok().map(|_| value.to_string())
        }
        _ => None,
    }
}

/// Accept http(s), mailto and relative references. Whitespace and control
/// characters are ignored when looking for the scheme, as browsers do.
pub fn safe_href(href: &str) -> Option<&str> {
    let href = href.trim();
    let compact: String = href
        .chars()
        .filter(|ch| !ch.is_whitespace() && !ch.is_control())
        .collect();

    let scheme_end = compact.find(':');
    let path_start = compact.find(['/', '?', '#']);
    match (scheme_end, path_start) {
        (Some(colon), Some(path)) if path < colon => Some(href),
        (Some(colon), _) => {
            let scheme = compact[..colon].to_ascii_lowercase();
            SAFE_SCHEMES.contains(&scheme.as_str()).then_some(href)
        }
        (None, _) => Some(href),
    }
}
