//! Safe, direction-aware Markdown rendering.
//!
//! Rendering happens in four passes: parse into an element tree, sanitize
//! against the allow-list, decorate with direction and link attributes, and
//! serialize. The sanitizer always runs between parsing and decoration.

pub mod decorate;
mod html;
pub mod sanitize;
pub mod tree;

pub use sanitize::{safe_href, sanitize};
pub use tree::{Element, Node};

use crate::config::BidiChatConfig;
use crate::text::{Direction, DirectionClassifier, NormalizedText, TextPipeline};
use crate::transcript::Message;
use crate::ui::locale::{LocaleProvider, StaticLocale};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Renders a normalized text view to sanitized HTML.
#[derive(Clone)]
pub struct SafeRenderer {
    classifier: DirectionClassifier,
    locale: Arc<dyn LocaleProvider>,
}

impl SafeRenderer {
    pub fn new(classifier: DirectionClassifier, locale: Arc<dyn LocaleProvider>) -> Self {
        Self { classifier, locale }
    }

    pub fn locale(&self) -> String {
        self.locale.locale()
    }

    /// Root direction: RTL for RTL content, the locale's direction otherwise.
    pub fn root_direction(&self, view: &NormalizedText) -> Direction {
        if view.is_rtl {
            Direction::Rtl
        } else {
            self.locale.direction()
        }
    }

    pub fn render(&self, view: &NormalizedText) -> String {
        let nodes = sanitize(tree::parse_markdown(&view.text));
        decorate::decorate(nodes, self.root_direction(view), &self.classifier).to_html()
    }
}

/// Pipeline plus renderer, with an LRU of completed messages.
///
/// Streaming messages are re-rendered on every call since their content keeps
/// growing. Completed content is immutable, so its HTML is cached by
/// `(locale, content)`.
pub struct MessageRenderer {
    pipeline: TextPipeline,
    renderer: SafeRenderer,
    cache: Option<Mutex<LruCache<(String, String), Arc<str>>>>,
}

impl MessageRenderer {
    pub fn new(pipeline: TextPipeline, renderer: SafeRenderer, cache_size: usize) -> Self {
        let cache = NonZeroUsize::new(cache_size).map(|size| Mutex::new(LruCache::new(size)));
        Self {
            pipeline,
            renderer,
            cache,
        }
    }

    pub fn from_config(config: &BidiChatConfig) -> Self {
        let pipeline = TextPipeline::from_config(&config.text);
        let locale: Arc<dyn LocaleProvider> =
            Arc::new(StaticLocale::new(config.render.locale.clone()));
        let renderer = SafeRenderer::new(*pipeline.classifier(), locale);
        Self::new(pipeline, renderer, config.render.cache_size)
    }

    pub fn pipeline(&self) -> &TextPipeline {
        &self.pipeline
    }

    /// Run the text pipeline and render, bypassing the cache.
    pub fn render_text(&self, raw: &str) -> String {
        let view = self.pipeline.run(raw);
        self.renderer.render(&view)
    }

    pub fn render_message(&self, message: &Message) -> Arc<str> {
        let Some(cache) = self.cache.as_ref().filter(|_| message.is_complete()) else {
            return Arc::from(self.render_text(&message.content));
        };

        let key = (self.renderer.locale(), message.content.clone());
        if let Some(html) = cache.lock().get(&key) {
            return Arc::clone(html);
        }

        let html: Arc<str> = Arc::from(self.render_text(&message.content));
        cache.lock().put(key, Arc::clone(&html));
        html
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.lock().len())
    }
}
