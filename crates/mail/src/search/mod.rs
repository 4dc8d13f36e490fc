//! Gmail search query construction
//!
//! Turns structured search requests into Gmail query strings:
//! - `from:john@example.com`, `to:`, `subject:`, `label:`, `category:`, `filename:`
//! - `"quoted words"` for free text
//! - `{rfc822msgid:<a> rfc822msgid:<b>}` for message-id lists
//! - `before:2024/12/01`, `after:2024/01/01`, validated to lie in the past

mod date;
mod field;
mod spec;
mod term;

pub use date::{infer_separator, validate_before};
pub use field::{FieldFormat, FieldRegistry, SearchField};
pub use spec::SearchSpec;
pub use term::{Combinator, build_term, build_term_at, combine};
