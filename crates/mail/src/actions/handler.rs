//! Action handler for account-level operations
//!
//! Label assignment through filters, marking the inbox read, and the
//! label and filter lookups they rely on.

use log::{info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{MailError, Result};
use crate::fetch::page_response;
use crate::gmail::MailApi;
use crate::gmail::api::{Filter, FilterAction, FilterCriteria};
use crate::models::{Label, LabelId, MessageId};

/// Query selecting unread inbox messages
const UNREAD_INBOX_QUERY: &str = "in:inbox is:unread";

/// Most messages handled by one `mark_all_read` run
const MARK_READ_LIMIT: usize = 500;

/// Handler for label and read-state changes
pub struct ActionHandler {
    api: Arc<dyn MailApi>,
}

impl ActionHandler {
    /// Create a new action handler
    pub fn new(api: Arc<dyn MailApi>) -> Self {
        Self { api }
    }

    /// Map label ids to names, or names to ids when `id_key` is false
    pub fn label_decode(&self, id_key: bool) -> Result<HashMap<String, String>> {
        let labels = self.api.list_labels()?.labels.unwrap_or_default();
        Ok(labels
            .into_iter()
            .map(|Label { id, name, .. }| if id_key { (id.0, name) } else { (name, id.0) })
            .collect())
    }

    /// Create label `name` and a filter applying it to mail from `addresses`.
    ///
    /// An existing label with the same name is deleted first when `force`
    /// is set; otherwise the call fails with [`MailError::LabelExists`].
    pub fn assign_label(&self, name: &str, addresses: &[String], force: bool) -> Result<Filter> {
        let by_name = self.label_decode(false)?;

        if let Some(existing) = by_name.get(name) {
            if !force {
                return Err(MailError::LabelExists(name.to_string()));
            }
            info!("Deleting existing label {:?} ({})", name, existing);
            if let Err(e) = self.api.delete_label(&LabelId::new(existing.as_str())) {
                warn!("Error deleting label: {:#}", e);
            }
        }

        let label = self.api.create_label(name)?;
        info!("Created label {:?} ({})", name, label.id.as_str());

        let filter = Filter {
            id: None,
            criteria: FilterCriteria {
                from: Some(sender_group(addresses)),
                query: None,
            },
            action: FilterAction {
                add_label_ids: vec![label.id.0.clone()],
                remove_label_ids: Vec::new(),
            },
        };
        Ok(self.api.create_filter(&filter)?)
    }

    /// Remove the UNREAD label from every unread inbox message, returning how many were changed
    pub fn mark_all_read(&self) -> Result<usize> {
        let refs = page_response(
            |query, token| self.api.list_messages(query, token),
            UNREAD_INBOX_QUERY,
            MARK_READ_LIMIT,
        )?;

        for message_ref in &refs {
            self.api
                .modify_message(&MessageId::new(&message_ref.id), &[], &[LabelId::UNREAD])?;
        }

        info!("Marked {} message(s) read", refs.len());
        Ok(refs.len())
    }

    /// List all filters active in the account
    pub fn list_filters(&self) -> Result<Vec<Filter>> {
        Ok(self.api.list_filters()?.filter.unwrap_or_default())
    }
}

/// Filter criteria matching any of `addresses` as sender
pub fn sender_group(addresses: &[String]) -> String {
    let terms: Vec<String> = addresses.iter().map(|a| format!("from: {}", a)).collect();
    format!("{{{}}}", terms.join(" "))
}

/// Follow `keys` into nested JSON objects and read a list of strings there
pub fn reduce_keys(document: &Value, keys: &[String]) -> Result<Vec<String>> {
    let mut current = document;
    for key in keys {
        current = current
            .get(key.as_str())
            .ok_or_else(|| MailError::JsonIndex(format!("{:?}", key)))?;
    }

    let list = current
        .as_array()
        .ok_or_else(|| MailError::JsonIndex(format!("value at {:?} is not a list", keys)))?;

    list.iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| MailError::JsonIndex(format!("non-string entry {}", item)))
        })
        .collect()
}
