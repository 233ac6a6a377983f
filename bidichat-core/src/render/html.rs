//! Minimal tokenizer for raw HTML fragments embedded in Markdown.
//!
//! The tokenizer only needs to recover tag structure so the sanitizer can see
//! it. Anything that does not look like a tag is kept as text and escaped on
//! output.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6}|[A-Za-z]{2,8});")
        .expect("entity pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HtmlToken {
    Text(String),
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
}

pub(crate) fn tokenize(input: &str) -> Vec<HtmlToken> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = input[pos..].find('<') {
        let lt = pos + offset;
        let rest = &input[lt..];

        let parsed = if rest.starts_with("<!--") {
            let end = rest
                .find("-->")
                .map_or(input.len(), |close| lt + close + 3);
            Some((None, end))
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            rest.find('>').map(|close| (None, lt + close + 1))
        } else if rest.starts_with("</") {
            parse_end_tag(rest).map(|(token, len)| (Some(token), lt + len))
        } else {
            parse_start_tag(rest).map(|(token, len)| (Some(token), lt + len))
        };

        match parsed {
            Some((token, end)) => {
                push_text(&mut tokens, &input[text_start..lt]);
                if let Some(token) = token {
                    tokens.push(token);
                }
                text_start = end;
                pos = end;
            }
            None => pos = lt + 1,
        }
    }

    push_text(&mut tokens, &input[text_start..]);
    tokens
}

fn push_text(tokens: &mut Vec<HtmlToken>, raw: &str) {
    if raw.is_empty() {
        return;
    }
    tokens.push(HtmlToken::Text(decode_entities(raw).into_owned()));
}

fn tag_name_len(input: &str) -> usize {
    let bytes = input.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_alphabetic) {
        return 0;
    }
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'-')
        .count()
}

fn parse_end_tag(rest: &str) -> Option<(HtmlToken, usize)> {
    let name_len = tag_name_len(&rest[2..]);
    if name_len == 0 {
        return None;
    }
    let name = rest[2..2 + name_len].to_ascii_lowercase();
    let close = rest.find('>')?;
    Some((HtmlToken::EndTag { name }, close + 1))
}

fn parse_start_tag(rest: &str) -> Option<(HtmlToken, usize)> {
    let name_len = tag_name_len(&rest[1..]);
    if name_len == 0 {
        return None;
    }
    let name = rest[1..1 + name_len].to_ascii_lowercase();
    let bytes = rest.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 1 + name_len;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match *bytes.get(i)? {
            b'>' => {
                let token = HtmlToken::StartTag {
                    name,
                    attrs,
                    self_closing: false,
                };
                return Some((token, i + 1));
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                let token = HtmlToken::StartTag {
                    name,
                    attrs,
                    self_closing: true,
                };
                return Some((token, i + 2));
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let attr_name = rest[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if bytes.get(i) == Some(&b'=') {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match *bytes.get(i)? {
                quote @ (b'"' | b'\'') => {
                    let close = rest[i + 1..].find(quote as char)?;
                    value = decode_entities(&rest[i + 1..i + 1 + close]).into_owned();
                    i += close + 2;
                }
                _ => {
                    let value_start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = decode_entities(&rest[value_start..i]).into_owned();
                }
            }
        }
        if !attr_name.is_empty() {
            attrs.push((attr_name, value));
        }
    }
}

/// Resolve the handful of named entities Markdown authors actually use plus
/// numeric references. Unknown entities are kept verbatim.
pub(crate) fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    ENTITY_RE.replace_all(text, |caps: &Captures| {
        let body = &caps[1];
        let hex = body
            .strip_prefix("#x")
            .or_else(|| body.strip_prefix("#X"));
        let decoded = if let Some(hex) = hex {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = body.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match body {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{00A0}'),
                _ => None,
            }
        };
        match decoded {
            Some(ch) if ch != '\0' => ch.to_string(),
            _ => caps[0].to_string(),
        }
    })
}
