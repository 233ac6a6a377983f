//! bidichat configuration module
//!
//! This module handles loading and managing configuration from bidichat.toml files.
//! Each section has serde defaults so a partial file (or no file at all) yields a
//! usable configuration.

pub mod constants;
pub mod loader;

pub use loader::{BidiChatConfig, ConfigManager};

use constants::defaults;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upstream stream settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Query endpoint receiving `{query, sessionToken?}`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Response header carrying the session correlation token
    #[serde(default = "default_session_header")]
    pub session_header: String,

    /// TCP connect timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum time to wait for the response headers and the first chunk
    #[serde(default = "default_first_chunk_timeout_secs")]
    pub first_chunk_timeout_secs: u64,

    /// Maximum silence between two chunks
    #[serde(default = "default_chunk_timeout_secs")]
    pub chunk_timeout_secs: u64,

    /// Assistant message shown when a stream fails
    #[serde(default = "default_failure_message")]
    pub failure_message: String,
}

fn default_endpoint() -> String {
    defaults::DEFAULT_ENDPOINT.to_string()
}
fn default_session_header() -> String {
    defaults::DEFAULT_SESSION_HEADER.to_string()
}
fn default_connect_timeout_secs() -> u64 {
    defaults::DEFAULT_CONNECT_TIMEOUT_SECS
}
fn default_first_chunk_timeout_secs() -> u64 {
    defaults::DEFAULT_FIRST_CHUNK_TIMEOUT_SECS
}
fn default_chunk_timeout_secs() -> u64 {
    defaults::DEFAULT_CHUNK_TIMEOUT_SECS
}
fn default_failure_message() -> String {
    defaults::DEFAULT_FAILURE_MESSAGE.to_string()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            session_header: default_session_header(),
            connect_timeout_secs: default_connect_timeout_secs(),
            first_chunk_timeout_secs: default_first_chunk_timeout_secs(),
            chunk_timeout_secs: default_chunk_timeout_secs(),
            failure_message: default_failure_message(),
        }
    }
}

impl StreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn first_chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.first_chunk_timeout_secs)
    }

    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }
}

/// Text pipeline tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextConfig {
    /// RTL character ratio above which a span is laid out right-to-left
    #[serde(default = "default_rtl_threshold")]
    pub rtl_threshold: f64,
}

fn default_rtl_threshold() -> f64 {
    defaults::DEFAULT_RTL_THRESHOLD
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            rtl_threshold: default_rtl_threshold(),
        }
    }
}

/// Renderer settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Active UI locale, used as the direction fallback for neutral content
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Number of completed messages whose rendered output is cached
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_locale() -> String {
    defaults::DEFAULT_LOCALE.to_string()
}
fn default_cache_size() -> usize {
    defaults::DEFAULT_RENDER_CACHE_SIZE
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            cache_size: default_cache_size(),
        }
    }
}

/// Viewport behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    /// Distance from the bottom (in pixels) still considered "at the bottom"
    #[serde(default = "default_autoscroll_threshold_px")]
    pub autoscroll_threshold_px: f32,
}

fn default_autoscroll_threshold_px() -> f32 {
    defaults::DEFAULT_AUTOSCROLL_THRESHOLD_PX
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            autoscroll_threshold_px: default_autoscroll_threshold_px(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    defaults::DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}
