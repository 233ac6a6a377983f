//! Bidi isolation of Latin and numeric runs embedded in RTL text.
//!
//! Without isolation the Unicode bidi algorithm reorders the neutral characters
//! around an embedded identifier or URL, so `Github.com/test` inside Arabic
//! prose shows up as `test/Github.com`. Each run is wrapped in LRI ... PDI so
//! the renderer lays it out as an independent left-to-right unit.

use crate::config::constants::bidi::{LRI, PDI};
use crate::text::segments::{Segment, split_fenced};
use once_cell::sync::Lazy;
use regex::Regex;

/// Latin-initial tokens, numeric tokens and http(s) URLs.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"https?://[^\s<>"]+"#,
        r"|[A-Za-z\x{00C0}-\x{024F}][A-Za-z\x{00C0}-\x{024F}0-9_@#./\-]*",
        r"|[0-9][0-9%()/:+.\-]*",
    ))
    .expect("token pattern is valid")
});

/// Spans that must reach the Markdown parser untouched.
static PROTECTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"[\x{2066}-\x{2068}][^\x{2069}]*\x{2069}", // existing isolates
        r"|``[^`]*``",                             // double backtick code span
        r"|`[^`\n]*`",                             // code span
        r"|\]\([^)\n]*\)",                         // link destination
        r"|<[^<>\n]*>",                            // autolink or HTML tag
        r"|&#?[A-Za-z0-9]+;",                      // HTML entity
    ))
    .expect("protected span pattern is valid")
});

/// Indentation, blockquote markers, list markers (with an optional task box)
/// and heading markers.
static LINE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^[ \t]*(?:>[ \t]*)*",
        r"(?:(?:[-*+]|\d{1,9}[.)])(?:[ \t]+|$)(?:\[[ xX]\](?:[ \t]+|$))?",
        r"|#{1,6}(?:[ \t]+|$))?",
    ))
    .expect("line prefix pattern is valid")
});

/// Characters never left at the end of a token. They read as sentence
/// punctuation or Markdown syntax rather than part of the run.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ':', ';', '-', '/', '+', '(', '_'];

/// Wrap every Latin, numeric or URL run in LRI ... PDI.
///
/// Text already inside isolates, code spans, link destinations, tags and
/// entities is left alone, which makes the function idempotent.
pub fn isolate_latin_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for protected in PROTECTED_RE.find_iter(text) {
        isolate_gap(&text[last..protected.start()], &mut out);
        out.push_str(protected.as_str());
        last = protected.end();
    }
    isolate_gap(&text[last..], &mut out);
    out
}

fn isolate_gap(gap: &str, out: &mut String) {
    let mut last = 0;
    for token in TOKEN_RE.find_iter(gap) {
        let run = trim_token(token.as_str());
        if run.is_empty() {
            continue;
        }
        out.push_str(&gap[last..token.start()]);
        out.push(LRI);
        out.push_str(run);
        out.push(PDI);
        last = token.start() + run.len();
    }
    out.push_str(&gap[last..]);
}

fn trim_token(token: &str) -> &str {
    let mut run = token;
    while let Some(last) = run.chars().next_back() {
        let unbalanced_close =
            last == ')' && run.matches(')').count() > run.matches('(').count();
        if TRAILING_PUNCTUATION.contains(&last) || unbalanced_close {
            run = &run[..run.len() - last.len_utf8()];
        } else {
            break;
        }
    }
    run
}

/// Isolate line content while leaving Markdown block markers in place.
///
/// Each line outside fenced code is split into its structural prefix (indent,
/// `>` markers, bullet or ordered marker, heading hashes) and the content after
/// it; only the content is isolated, so `1. Rust` keeps a parseable `1. `.
pub fn repair_mixed_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    for segment in split_fenced(text) {
        match segment {
            Segment::Code(code) => out.push_str(code),
            Segment::Prose(prose) => {
                for line in prose.split_inclusive('\n') {
                    isolate_line(line, &mut out);
                }
            }
        }
    }
    out
}

fn isolate_line(line: &str, out: &mut String) {
    let (body, newline) = match line.strip_suffix('\n') {
        Some(body) => (body, "\n"),
        None => (line, ""),
    };
    let prefix_len = LINE_PREFIX_RE.find(body).map_or(0, |m| m.end());
    out.push_str(&body[..prefix_len]);
    out.push_str(&isolate_latin_runs(&body[prefix_len..]));
    out.push_str(newline);
}
