//! Text pipeline stages.
//!
//! Every stage is a pure `&str -> String` function that accepts any input and
//! never fails; malformed Markdown or escapes degrade to plain text.
//! [`TextPipeline`] chains them in the order the renderer expects.

pub mod bidi;
pub mod direction;
pub mod escape;
pub mod pipeline;
pub mod repair;
pub mod script;
pub mod segments;

pub use bidi::{isolate_latin_runs, repair_mixed_lines};
pub use direction::{Direction, DirectionClassifier, has_rtl, is_rtl};
pub use escape::decode;
pub use pipeline::{NormalizedText, TextPipeline};
pub use repair::repair;
pub use script::normalize;
