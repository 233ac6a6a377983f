//! Splits Markdown into fenced-code and prose regions so line-oriented
//! heuristics never touch code.

/// A contiguous slice of the source, either inside a fenced code block
/// (fence lines included) or outside of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Prose(&'a str),
    Code(&'a str),
}

/// Split `text` into prose and fenced-code segments. An unterminated fence
/// runs to the end of the input. Concatenating the segments yields `text`.
pub fn split_fenced(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    let mut open_fence: Option<(char, usize)> = None;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        match open_fence {
            None => {
                if let Some(marker) = fence_marker(line) {
                    if line_start > start {
                        segments.push(Segment::Prose(&text[start..line_start]));
                    }
                    start = line_start;
                    open_fence = Some(marker);
                }
            }
            Some((fence_char, fence_len)) => {
                if is_closing_fence(line, fence_char, fence_len) {
                    segments.push(Segment::Code(&text[start..offset]));
                    start = offset;
                    open_fence = None;
                }
            }
        }
    }

    if start < text.len() {
        let rest = &text[start..];
        segments.push(if open_fence.is_some() {
            Segment::Code(rest)
        } else {
            Segment::Prose(rest)
        });
    }

    segments
}

/// Fence character and run length when `line` opens a fenced block.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let fence_char = trimmed.chars().next()?;
    if fence_char != '`' && fence_char != '~' {
        return None;
    }
    let run = trimmed.chars().take_while(|ch| *ch == fence_char).count();
    (run >= 3).then_some((fence_char, run))
}

fn is_closing_fence(line: &str, fence_char: char, fence_len: usize) -> bool {
    match fence_marker(line) {
        Some((ch, len)) if ch == fence_char && len >= fence_len => {
            let trimmed = line.trim();
            trimmed.chars().all(|c| c == fence_char)
        }
        _ => false,
    }
}
