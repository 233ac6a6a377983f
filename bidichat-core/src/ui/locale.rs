use crate::config::constants::locales::RTL_LANGUAGES;
use crate::text::Direction;
use parking_lot::RwLock;

/// Supplies the active UI locale. The renderer only consults it for the
/// direction of content that has none of its own.
pub trait LocaleProvider: Send + Sync {
    fn locale(&self) -> String;

    fn direction(&self) -> Direction {
        natural_direction(&self.locale())
    }
}

/// Natural writing direction of a BCP 47 style tag (`fa`, `ar-EG`, `he_IL`).
pub fn natural_direction(locale: &str) -> Direction {
    let primary = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if RTL_LANGUAGES.contains(&primary.as_str()) {
        Direction::Rtl
    } else {
        Direction::Ltr
    }
}

/// Fixed locale, e.g. from configuration.
#[derive(Debug, Clone)]
pub struct StaticLocale(String);

impl StaticLocale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self(locale.into())
    }
}

impl LocaleProvider for StaticLocale {
    fn locale(&self) -> String {
        self.0.clone()
    }
}

/// Locale that can be switched at runtime.
#[derive(Debug)]
pub struct SharedLocale(RwLock<String>);

impl SharedLocale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self(RwLock::new(locale.into()))
    }

    pub fn set(&self, locale: impl Into<String>) {
        *self.0.write() = locale.into();
    }
}

impl LocaleProvider for SharedLocale {
    fn locale(&self) -> String {
        self.0.read().clone()
    }
}
