/// Default values shared by the configuration loader and the runtime
pub mod defaults {
    pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/chat";
    pub const DEFAULT_SESSION_HEADER: &str = "x-session-id";
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_FIRST_CHUNK_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_CHUNK_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_FAILURE_MESSAGE: &str =
        "Sorry, something went wrong while generating a response. Please try again.";

    /// Share of meaningful characters that must be RTL before a block is laid out RTL.
    /// Empirically tuned; the comparison is strict.
    pub const DEFAULT_RTL_THRESHOLD: f64 = 0.30;

    pub const DEFAULT_LOCALE: &str = "en";
    pub const DEFAULT_RENDER_CACHE_SIZE: usize = 128;
    pub const DEFAULT_AUTOSCROLL_THRESHOLD_PX: f32 = 48.0;
    pub const DEFAULT_LOG_FILTER: &str = "warn";
    pub const DEFAULT_EVENT_CAPACITY: usize = 256;
}

/// Configuration file naming
pub mod files {
    pub const CONFIG_FILE_NAME: &str = "bidichat.toml";
    pub const CONFIG_DIR_NAME: &str = ".bidichat";
}

/// Unicode directional formatting characters
pub mod bidi {
    /// LEFT-TO-RIGHT ISOLATE
    pub const LRI: char = '\u{2066}';
    /// POP DIRECTIONAL ISOLATE
    pub const PDI: char = '\u{2069}';
    pub const ZWNJ: char = '\u{200C}';
    pub const ZWJ: char = '\u{200D}';
}

/// Locales whose natural writing direction is right-to-left
pub mod locales {
    pub const RTL_LANGUAGES: &[&str] = &[
        "ar", "fa", "he", "iw", "ur", "ps", "ckb", "ku", "yi", "dv", "sd", "ug",
    ];
}

/// Fixed attribute values forced by the renderer
pub mod render {
    pub const LINK_TARGET: &str = "_blank";
    pub const LINK_REL: &str = "noopener noreferrer nofollow";
    pub const ROOT_CLASS: &str = "markdown-body";
    pub const TABLE_WRAPPER_CLASS: &str = "table-scroll";
    pub const TABLE_WRAPPER_STYLE: &str = "overflow-x:auto";
}
