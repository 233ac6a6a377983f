//! Canonicalization of Arabic-script variants.
//!
//! Persian, Urdu and Kurdish text uses several codepoints that render almost
//! identically to their Arabic counterparts but compare differently. Mapping
//! them onto one canonical form keeps direction detection and rendering
//! consistent regardless of which keyboard produced the text.

use crate::config::constants::bidi::{ZWJ, ZWNJ};

/// Source codepoint and its canonical Arabic replacement.
const LETTER_TABLE: &[(char, char)] = &[
    ('\u{06A9}', '\u{0643}'), // keheh -> kaf
    ('\u{06AA}', '\u{0643}'), // swash kaf -> kaf
    ('\u{06CC}', '\u{064A}'), // farsi yeh -> yeh
    ('\u{06CD}', '\u{064A}'), // yeh with tail -> yeh
    ('\u{06D0}', '\u{064A}'), // e -> yeh
    ('\u{06C1}', '\u{0647}'), // heh goal -> heh
    ('\u{06BE}', '\u{0647}'), // heh doachashmee -> heh
    ('\u{06D5}', '\u{0647}'), // ae -> heh
];

const EXTENDED_DIGIT_ZERO: u32 = 0x06F0;
const EXTENDED_DIGIT_NINE: u32 = 0x06F9;
const ARABIC_INDIC_DIGIT_ZERO: u32 = 0x0660;

/// Map Persian/Urdu/Kurdish letters and digits to canonical Arabic codepoints
/// and drop zero-width joiners. Idempotent.
pub fn normalize(text: &str) -> String {
    text.chars().filter_map(canonical_char).collect()
}

fn canonical_char(ch: char) -> Option<char> {
    if ch == ZWNJ || ch == ZWJ {
        return None;
    }

    let code = ch as u32;
    if (EXTENDED_DIGIT_ZERO..=EXTENDED_DIGIT_NINE).contains(&code) {
        return char::from_u32(code - EXTENDED_DIGIT_ZERO + ARABIC_INDIC_DIGIT_ZERO);
    }

    Some(
        LETTER_TABLE
            .iter()
            .find(|(from, _)| *from == ch)
            .map(|(_, to)| *to)
            .unwrap_or(ch),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_persian_letters_to_arabic() {
        assert_eq!(normalize("کتاب"), "كتاب");
        assert_eq!(normalize("یک"), "يك");
        assert_eq!(normalize("ہ ھ ە"), "ه ه ه");
    }

    #[test]
    fn maps_extended_digits_to_arabic_indic() {
        assert_eq!(normalize("۱۲۳۰"), "١٢٣٠");
        // ASCII and Arabic-Indic digits are already canonical
        assert_eq!(normalize("42 ٤٢"), "42 ٤٢");
    }

    #[test]
    fn strips_zero_width_joiners() {
        assert_eq!(normalize("می\u{200C}خواهم"), "ميخواهم");
        assert_eq!(normalize("a\u{200D}b"), "ab");
    }

    #[test]
    fn leaves_arabic_and_latin_untouched() {
        let input = "مرحبا Github.com/test شكرا";
        assert_eq!(normalize(input), input);
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "",
            "سلام دنیا ۱۴۰۲",
            "کی\u{200C}بورد ی ک ۹",
            "mixed ﻻ text \u{06D0}\u{06CD}",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }
}
