use crate::config::TextConfig;
use crate::text::bidi::repair_mixed_lines;
use crate::text::direction::{Direction, DirectionClassifier};
use crate::text::{escape, repair, script};

/// Render-ready view of a message's content. Derived on demand, never stored
/// on the message itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub is_rtl: bool,
}

impl NormalizedText {
    pub fn direction(&self) -> Direction {
        if self.is_rtl {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }
}

/// Runs the text stages in order: script normalization, escape decoding,
/// structural repair, classification and (for RTL text) bidi isolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPipeline {
    classifier: DirectionClassifier,
}

impl TextPipeline {
    pub fn new(classifier: DirectionClassifier) -> Self {
        Self { classifier }
    }

    pub fn from_config(config: &TextConfig) -> Self {
        Self::new(DirectionClassifier::new(config.rtl_threshold))
    }

    pub fn classifier(&self) -> &DirectionClassifier {
        &self.classifier
    }

    pub fn run(&self, raw: &str) -> NormalizedText {
        let text = script::normalize(raw);
        let decoded = escape::decode(&text);
        // `\uXXXX` may have revealed non-canonical letters
        let text = if decoded == text {
            text
        } else {
            script::normalize(&decoded)
        };
        let text = repair::repair(&text);

        let is_rtl = self.classifier.is_rtl(&text);
        let text = if is_rtl {
            repair_mixed_lines(&text)
        } else {
            text
        };

        tracing::trace!(is_rtl, len = text.len(), "normalized text");
        NormalizedText { text, is_rtl }
    }
}
