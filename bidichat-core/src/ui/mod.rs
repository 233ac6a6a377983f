//! View-side helpers: locale lookup and autoscroll decisions.

pub mod autoscroll;
pub mod locale;

pub use autoscroll::{AutoscrollController, ViewportMetrics};
pub use locale::{LocaleProvider, SharedLocale, StaticLocale, natural_direction};
