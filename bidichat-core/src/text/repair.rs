//! Heuristic repair of malformed Markdown produced by text generators.
//!
//! Model output frequently glues block constructs together ("Intro. - item",
//! "text## Heading", "first2. second") or uses bullet glyphs Markdown does not
//! recognise. The passes below restore block structure before parsing. They run
//! in a fixed order because later passes rely on the canonical bullets produced
//! by earlier ones, and none of them touches fenced code.

use crate::text::segments::{Segment, split_fenced};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

static WHOLE_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A\s*(```|~~~)[^\n`]*\n(.*?)\n?[ \t]*(```|~~~)\s*\z")
        .expect("whole fence pattern is valid")
});

static BULLET_GLYPH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)[•●◦▪■▫‣∙·٭*+–—][ \t]+([^\n]*)$")
        .expect("bullet glyph pattern is valid")
});

static GLUED_MULTI_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\s#>|*+\-])[ \t]*(#{2,6}[ \t]+\S)").expect("glued heading pattern is valid")
});

// A lone `#` is only a heading when it follows sentence punctuation or Arabic
// script, so "C# and F#" stays intact.
static GLUED_SINGLE_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([.!?:؛؟۔)\]\p{Arabic}])[ \t]*(#[ \t]+\S)")
        .expect("glued single heading pattern is valid")
});

static TITLE_DASH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(\p{L}+(?:[ \t]\p{L}+){0,3})[ \t]+[-–—][ \t]+(\S[^\n]*)$")
        .expect("title dash pattern is valid")
});

static SENTENCE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(^|[^\d])([.!?؟؛:۔])[ \t]*(-[ \t]+\S|\d{1,3}[.)][ \t]+\S)")
        .expect("sentence marker pattern is valid")
});

static GLUED_ORDERED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\s\d(\[{#/\\.,:;_\-])(\d{1,3}[.)][ \t]+)(\S)")
        .expect("glued ordered marker pattern is valid")
});

static BULLET_SPACING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)-[ \t]+(\S)").expect("bullet spacing pattern is valid"));

static TRAILING_WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+\n").expect("trailing whitespace pattern is valid"));

static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank run pattern is valid"));

/// Repair block structure. `repair(repair(x)) == repair(x)`.
pub fn repair(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = unwrap_whole_fence(&text);

    let mut out = String::with_capacity(text.len());
    for segment in split_fenced(&text) {
        match segment {
            Segment::Code(code) => out.push_str(code),
            Segment::Prose(prose) => out.push_str(&repair_prose(prose)),
        }
    }
    out
}

fn repair_prose(prose: &str) -> String {
    let text = canonicalize_bullets(prose);
    let text = split_glued_headings(&text);
    let text = split_title_dash(&text);
    let text = break_after_sentence(&text);
    let text = break_glued_ordered(&text);
    let text = normalize_bullet_spacing(&text);
    collapse_blank_lines(&text)
}

/// Step 1: strip a fence that wraps the entire reply.
fn unwrap_whole_fence(text: &str) -> Cow<'_, str> {
    let Some(caps) = WHOLE_FENCE_RE.captures(text) else {
        return Cow::Borrowed(text);
    };
    let open = &caps[1];
    let inner = &caps[2];
    if open != &caps[3] || inner.contains("```") || inner.contains("~~~") {
        return Cow::Borrowed(text);
    }
    Cow::Owned(inner.to_string())
}

/// Step 2: `•`, `*`, `٭`, ... at line start become `- `.
fn canonicalize_bullets(text: &str) -> String {
    BULLET_GLYPH_RE
        .replace_all(text, |caps: &Captures| {
            let whole = &caps[0];
            if is_thematic_break(whole) {
                whole.to_string()
            } else {
                format!("{}- {}", &caps[1], &caps[2])
            }
        })
        .into_owned()
}

fn is_thematic_break(line: &str) -> bool {
    let mut marks = line.chars().filter(|ch| !ch.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '*' | '-' | '_') {
        return false;
    }
    let mut count = 1;
    for ch in marks {
        if ch != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

/// Step 3: "text## Heading" moves the heading onto its own line.
fn split_glued_headings(text: &str) -> String {
    let text = until_stable(text, |text| {
        GLUED_MULTI_HEADING_RE.replace_all(text, "$1\n\n$2").into_owned()
    });
    until_stable(&text, |text| {
        GLUED_SINGLE_HEADING_RE
            .replace_all(text, "$1\n\n$2")
            .into_owned()
    })
}

/// Step 4: "Title - description" becomes a heading followed by a list item.
fn split_title_dash(text: &str) -> String {
    TITLE_DASH_RE
        .replace_all(text, "### $1\n- $2")
        .into_owned()
}

/// Step 5: "Intro. - item" breaks the line before the marker.
fn break_after_sentence(text: &str) -> String {
    until_stable(text, |text| {
        SENTENCE_MARKER_RE
            .replace_all(text, "$1$2\n$3")
            .into_owned()
    })
}

/// Step 6: "first2. second" breaks the line before the ordered marker.
/// "Python3. It works" is kept: a Latin word ending in a digit followed by a
/// capitalized sentence reads as an identifier, not a list.
fn break_glued_ordered(text: &str) -> String {
    until_stable(text, |text| {
        GLUED_ORDERED_RE
            .replace_all(text, |caps: &Captures| {
                let before = &caps[1];
                let next = &caps[3];
                let identifier = before.chars().all(|ch| ch.is_ascii_alphabetic())
                    && next.chars().all(|ch| ch.is_uppercase());
                if identifier {
                    caps[0].to_string()
                } else {
                    format!("{before}\n{}{next}", &caps[2])
                }
            })
            .into_owned()
    })
}

/// Step 7: exactly one space after a `-` bullet.
fn normalize_bullet_spacing(text: &str) -> String {
    BULLET_SPACING_RE.replace_all(text, "$1- $2").into_owned()
}

/// Patterns that consume the first character of the next item miss a marker
/// glued right after a one-character item, so each pass repeats until nothing
/// changes. Every replacement only inserts line breaks, which terminates.
fn until_stable(text: &str, pass: impl Fn(&str) -> String) -> String {
    let mut current = pass(text);
    loop {
        let next = pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Step 8: no trailing whitespace, at most one blank line in a row.
fn collapse_blank_lines(text: &str) -> String {
    let text = TRAILING_WHITESPACE_RE.replace_all(text, "\n");
    BLANK_RUN_RE.replace_all(&text, "\n\n").into_owned()
}
