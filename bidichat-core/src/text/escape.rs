//! Reverses transport-level string escaping.
//!
//! Some upstream services double-encode their output, so the text arrives with
//! literal `\n` or `\u0628` sequences instead of the characters themselves.

/// Decode literal `\n`, `\r`, `\t`, `\\` and `\uXXXX` sequences in a single
/// left-to-right pass. Unknown escapes and malformed `\u` sequences are kept
/// verbatim, so text without escapes is returned unchanged.
pub fn decode(text: &str) -> String {
    if !text.contains('\\') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let escape = &rest[pos..];

        let consumed = match escape.as_bytes().get(1) {
            Some(b'n') => {
                out.push('\n');
                2
            }
            Some(b'r') => {
                out.push('\r');
                2
            }
            Some(b't') => {
                out.push('\t');
                2
            }
            Some(b'\\') => {
                out.push('\\');
                2
            }
            Some(b'u') => match decode_unicode_escape(escape) {
                Some((ch, len)) => {
                    out.push(ch);
                    len
                }
                None => {
                    out.push('\\');
                    1
                }
            },
            _ => {
                out.push('\\');
                1
            }
        };

        rest = &escape[consumed..];
    }

    out.push_str(rest);
    out
}

/// Parse `\uXXXX` (optionally a surrogate pair `\uD83D\uDE00`) at the start of
/// `input`. Returns the decoded char and the number of bytes consumed.
fn decode_unicode_escape(input: &str) -> Option<(char, usize)> {
    let high = parse_hex4(input.get(2..6)?)?;

    if (0xD800..=0xDBFF).contains(&high) {
        let low_part = input.get(6..12)?;
        if !low_part.starts_with("\\u") {
            return None;
        }
        let low = parse_hex4(&low_part[2..])?;
        if !(0xDC00..=0xDFFF).contains(&low) {
            return None;
        }
        let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        return char::from_u32(combined).map(|ch| (ch, 12));
    }

    char::from_u32(high).map(|ch| (ch, 6))
}

fn parse_hex4(digits: &str) -> Option<u32> {
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}
