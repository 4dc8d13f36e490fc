//! Mail crate - Business logic for gmailtools
//!
//! This crate provides:
//! - Gmail search query construction with validated date filters
//! - Gmail API client and OAuth authentication behind the `MailApi` trait
//! - Paged search and extraction of headers, bodies and attachments
//! - Actions on retrieved messages (print, store, download) and on the
//!   account (label assignment, mark read)
//!
//! Everything is synchronous; each call blocks until the API answers.

pub mod actions;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gmail;
pub mod models;
pub mod search;

pub use actions::{ActionHandler, ActionOutcome, PostAction, dispatch};
pub use config::{AuthConfig, GmailCredentials};
pub use error::{MailError, Result};
pub use fetch::{fetch_messages, page_response};
pub use gmail::{BodyFormat, GmailAuth, GmailClient, InMemoryMailApi, MailApi, parse_message};
pub use models::{Attachments, Label, LabelId, MessageData, MessageId, ParsedMessage};
pub use search::{Combinator, FieldRegistry, SearchField, SearchSpec, build_term, combine};
