//! Pin-to-bottom logic for the transcript viewport.

use crate::config::UiConfig;
use crate::transcript::{Role, TranscriptEvent};

/// Scroll geometry reported by the view, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportMetrics {
    pub scroll_top: f32,
    pub scroll_height: f32,
    pub client_height: f32,
}

impl ViewportMetrics {
    pub fn distance_from_bottom(&self) -> f32 {
        (self.scroll_height - self.scroll_top - self.client_height).max(0.0)
    }
}

/// Decides whether a transcript mutation should scroll the view to the end.
///
/// The view stays pinned while the user is within `threshold` pixels of the
/// bottom. Scrolling further up unpins it until they return.
#[derive(Debug, Clone)]
pub struct AutoscrollController {
    pinned: bool,
    threshold: f32,
}

impl Default for AutoscrollController {
    fn default() -> Self {
        Self::from_config(&UiConfig::default())
    }
}

impl AutoscrollController {
    pub fn new(threshold: f32) -> Self {
        Self {
            pinned: true,
            threshold: threshold.max(0.0),
        }
    }

    pub fn from_config(config: &UiConfig) -> Self {
        Self::new(config.autoscroll_threshold_px)
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn on_user_scroll(&mut self, metrics: ViewportMetrics) {
        self.pinned = metrics.distance_from_bottom() <= self.threshold;
    }

    pub fn should_scroll(&mut self, event: &TranscriptEvent) -> bool {
        match event {
            // Sending a message always brings the view back down
            TranscriptEvent::Added {
                role: Role::User, ..
            } => {
                self.pinned = true;
                true
            }
            TranscriptEvent::Discarded { .. } => false,
            _ => self.pinned,
        }
    }
}
