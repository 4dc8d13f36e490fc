//! Email actions module
//!
//! Post-search actions on retrieved messages (print, store, download)
//! and account-level actions (label assignment, mark read).

mod handler;
mod output;

pub use handler::{ActionHandler, reduce_keys, sender_group};
pub use output::{
    download_attachments, format_message, path_writable, print_messages, separator,
    store_messages,
};

use std::path::PathBuf;

use crate::error::Result;
use crate::models::ParsedMessage;

/// What to do with the messages a search returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAction {
    /// Print every message; `await_menu` asks the caller to offer follow-up actions
    Print { await_menu: bool },
    /// Save the messages as JSON
    Store {
        output: PathBuf,
        allow_overwrite: bool,
        verbose: bool,
    },
    /// Save every attachment into a directory
    Download {
        dir: PathBuf,
        force: bool,
        verbose: bool,
    },
}

/// Result of running a [`PostAction`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Printed { count: usize },
    Stored { path: PathBuf, count: usize },
    Downloaded { files: Vec<String> },
}

/// Run `action` over `messages`
pub fn dispatch(messages: &[ParsedMessage], action: &PostAction) -> Result<ActionOutcome> {
    match action {
        PostAction::Print { .. } => {
            print_messages(messages);
            Ok(ActionOutcome::Printed {
                count: messages.len(),
            })
        }
        PostAction::Store {
            output,
            allow_overwrite,
            verbose,
        } => {
            let path = store_messages(messages, output, *allow_overwrite, *verbose)?;
            Ok(ActionOutcome::Stored {
                path,
                count: messages.len(),
            })
        }
        PostAction::Download { dir, force, verbose } => {
            let files = download_attachments(messages, dir, *force, *verbose)?;
            Ok(ActionOutcome::Downloaded { files })
        }
    }
}
