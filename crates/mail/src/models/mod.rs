//! Domain models for mail entities

mod label;
mod message;

pub use label::{Label, LabelId};
pub use message::{Attachments, MessageData, MessageId, ParsedMessage, dedupe_by_id};
