//! Ratio-based text direction detection.
//!
//! A span is laid out right-to-left when RTL letters make up more than a
//! configurable share of its meaningful characters. The threshold sits well
//! below a majority so that Persian prose peppered with Latin identifiers,
//! URLs and numbers still reads right-to-left.

use crate::config::constants::defaults::DEFAULT_RTL_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unicode blocks whose letters are written right-to-left.
const RTL_RANGES: &[(u32, u32)] = &[
    (0x0590, 0x05FF), // Hebrew
    (0x0600, 0x06FF), // Arabic
    (0x0750, 0x077F), // Arabic Supplement
    (0x0870, 0x089F), // Arabic Extended-B
    (0x08A0, 0x08FF), // Arabic Extended-A
    (0xFB1D, 0xFB4F), // Hebrew presentation forms
    (0xFB50, 0xFDFF), // Arabic Presentation Forms-A
    (0xFE70, 0xFEFF), // Arabic Presentation Forms-B
];

/// Punctuation living inside the Arabic block.
const ARABIC_PUNCTUATION: &[char] = &[
    '\u{060C}', // comma
    '\u{061B}', // semicolon
    '\u{061F}', // question mark
    '\u{066A}', // percent sign
    '\u{066B}', // decimal separator
    '\u{066C}', // thousands separator
    '\u{066D}', // five pointed star
    '\u{06D4}', // full stop
];

/// Resolved writing direction of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true when `ch` belongs to one of the RTL blocks.
pub fn is_rtl_char(ch: char) -> bool {
    let code = ch as u32;
    RTL_RANGES
        .iter()
        .any(|(start, end)| (*start..=*end).contains(&code))
}

/// Whitespace, punctuation, symbols and invisible format controls carry no
/// direction of their own.
fn is_neutral(ch: char) -> bool {
    ch.is_whitespace()
        || ch.is_ascii_punctuation()
        || ch.is_control()
        || ARABIC_PUNCTUATION.contains(&ch)
        || matches!(ch as u32,
            0x00A1..=0x00BF       // Latin-1 punctuation and symbols
            | 0x00D7 | 0x00F7     // multiplication and division signs
            | 0x2000..=0x206F     // General Punctuation, incl. bidi controls
            | 0x2190..=0x21FF     // arrows
            | 0x3000..=0x303F     // CJK punctuation
            | 0xFEFF              // byte order mark
        )
}

/// Character counts backing a direction decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionStats {
    pub rtl: usize,
    pub meaningful: usize,
}

impl DirectionStats {
    pub fn measure(text: &str) -> Self {
        let mut stats = Self::default();
        for ch in text.chars() {
            if is_neutral(ch) {
                continue;
            }
            stats.meaningful += 1;
            if is_rtl_char(ch) {
                stats.rtl += 1;
            }
        }
        stats
    }

    /// Share of meaningful characters that are RTL, `None` for neutral text.
    pub fn ratio(&self) -> Option<f64> {
        if self.meaningful == 0 {
            None
        } else {
            Some(self.rtl as f64 / self.meaningful as f64)
        }
    }
}

/// Direction classifier with a tunable threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionClassifier {
    threshold: f64,
}

impl Default for DirectionClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RTL_THRESHOLD)
    }
}

impl DirectionClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True iff the RTL ratio strictly exceeds the threshold. Empty or
    /// punctuation-only text is LTR.
    pub fn is_rtl(&self, text: &str) -> bool {
        if !has_rtl(text) {
            return false;
        }
        DirectionStats::measure(text)
            .ratio()
            .is_some_and(|ratio| ratio > self.threshold)
    }

    /// Direction of `text`, or `None` when it has no meaningful characters.
    pub fn classify(&self, text: &str) -> Option<Direction> {
        let stats = DirectionStats::measure(text);
        stats.ratio().map(|ratio| {
            if ratio > self.threshold {
                Direction::Rtl
            } else {
                Direction::Ltr
            }
        })
    }

    /// Like [`classify`](Self::classify) but falls back for neutral text.
    pub fn direction_or(&self, text: &str, fallback: Direction) -> Direction {
        self.classify(text).unwrap_or(fallback)
    }
}

/// Ratio check with the default threshold.
pub fn is_rtl(text: &str) -> bool {
    DirectionClassifier::default().is_rtl(text)
}

/// True when any RTL character is present at all.
pub fn has_rtl(text: &str) -> bool {
    text.chars().any(is_rtl_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_punctuation_only_text_is_ltr() {
        assert!(!is_rtl(""));
        assert!(!is_rtl("   \n\t"));
        assert!(!is_rtl("... ؟ ، !!"));
        assert_eq!(DirectionClassifier::default().classify("--- ***"), None);
    }

    #[test]
    fn arabic_prose_is_rtl() {
        assert!(is_rtl("مرحبا بك في الموقع"));
        assert!(is_rtl("שלום עולם"));
    }

    #[test]
    fn latin_prose_is_ltr() {
        assert!(!is_rtl("Hello world, this is a test."));
    }

    #[test]
    fn minority_latin_terms_keep_text_rtl() {
        assert!(is_rtl("برای نصب از دستور cargo install استفاده کنید"));
        assert!(is_rtl("مرحبا بك Github.com/test شكرا"));
    }

    #[test]
    fn threshold_is_strict() {
        // 3 RTL letters out of 10 meaningful characters: exactly 0.30
        let text = "abcdefg بتث";
        let stats = DirectionStats::measure(text);
        assert_eq!(stats, DirectionStats { rtl: 3, meaningful: 10 });
        assert!(!is_rtl(text));

        // 4 out of 10 crosses the threshold
        assert!(is_rtl("abcdef بتثج"));
    }

    #[test]
    fn custom_threshold_is_honored() {
        let strict = DirectionClassifier::new(0.6);
        assert!(!strict.is_rtl("abcdef بتثج"));
        assert!(strict.is_rtl("ab بتثج"));
    }

    #[test]
    fn has_rtl_detects_any_rtl_character() {
        assert!(has_rtl("see ب"));
        assert!(!has_rtl("plain ascii"));
        assert!(has_rtl("\u{FB50}"));
    }

    #[test]
    fn isolate_controls_are_neutral() {
        let wrapped = "\u{2066}abc\u{2069}";
        assert_eq!(DirectionStats::measure(wrapped).meaningful, 3);
    }

    #[test]
    fn fallback_applies_only_to_neutral_text() {
        let classifier = DirectionClassifier::default();
        assert_eq!(classifier.direction_or("123 ...", Direction::Rtl), Direction::Ltr);
        assert_eq!(classifier.direction_or("—", Direction::Rtl), Direction::Rtl);
        assert_eq!(classifier.direction_or("سلام", Direction::Ltr), Direction::Rtl);
    }
}
