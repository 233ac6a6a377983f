//! # bidichat-core - Runtime for bidichat
//!
//! `bidichat-core` powers the bidichat streaming chat client. It turns a
//! chunked reply from a query endpoint into a transcript of messages and
//! renders each message as sanitized HTML whose text direction is correct
//! for mixed Arabic, Persian and English content.
//!
//! ## Highlights
//!
//! - **Streaming Transcript**: one in-flight assistant message per
//!   conversation, replaced after every chunk; a new query supersedes the
//!   running stream and drops its partial reply.
//! - **Text Pipeline**: Persian/Urdu letter folding onto Arabic, literal escape
//!   decoding, Markdown structural repair and bidi isolation of embedded
//!   Latin runs.
//! - **Safe Rendering**: Markdown is parsed into an element tree, filtered
//!   against a tag and attribute allow-list, then decorated with per-block
//!   `dir` attributes before serialization.
//! - **Configuration-First**: everything is driven by `bidichat.toml`, with
//!   defaults centralized in `config::constants`.
//!
//! ## Architecture Overview
//!
//! - `config/`: configuration loader and defaults.
//! - `stream/`: transport, UTF-8 chunk decoding, session token and the
//!   stream consumer.
//! - `transcript`: ordered messages and change events.
//! - `text/`: the normalization pipeline and direction classifier.
//! - `render/`: Markdown tree, sanitizer and direction decoration.
//! - `ui/`: locale provider and autoscroll controller.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use bidichat_core::{BidiChatConfig, Conversation, MessageRenderer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BidiChatConfig::default();
//!     let conversation = Conversation::from_config(&config)?;
//!     let renderer = MessageRenderer::from_config(&config);
//!
//!     conversation.send("سلام، Rust چیست؟")?.outcome().await;
//!     for message in conversation.messages() {
//!         println!("{}", renderer.render_message(&message));
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod render;
pub mod stream;
pub mod text;
pub mod transcript;
pub mod ui;

// Re-exports for convenience
pub use config::{BidiChatConfig, ConfigManager};
pub use render::{MessageRenderer, SafeRenderer};
pub use stream::{
    Conversation, HttpTransport, QueryTransport, SendError, StreamError, StreamHandle,
    StreamOutcome,
};
pub use text::{Direction, DirectionClassifier, NormalizedText, TextPipeline};
pub use transcript::{Message, MessageId, MessageStatus, Role, Transcript, TranscriptEvent};
pub use ui::{AutoscrollController, LocaleProvider, SharedLocale, StaticLocale};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_library_exports() {
        let config = BidiChatConfig::default();
        let renderer = MessageRenderer::from_config(&config);
        let html = renderer.render_text("**bold**");
        assert!(html.contains("<strong>bold</strong>"));

        let _locale: Arc<dyn LocaleProvider> = Arc::new(StaticLocale::new("fa"));
        let _autoscroll = AutoscrollController::from_config(&config.ui);
    }

    #[tokio::test]
    async fn test_conversation_from_default_config() {
        let conversation = Conversation::from_config(&BidiChatConfig::default()).unwrap();
        assert!(conversation.messages().is_empty());
        assert!(!conversation.is_responding());
        assert_eq!(conversation.send("   ").unwrap_err(), SendError::EmptyQuery);
    }
}
