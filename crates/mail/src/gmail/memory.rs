//! In-memory provider implementation
//!
//! Serves canned messages, labels and filters without network access.
//! Search pages are cut from a fixed result list; the query string is
//! recorded but not interpreted.

use anyhow::{Result, bail};
use std::collections::HashMap;
use std::sync::RwLock;

use super::MailApi;
use super::api::{
    AttachmentResponse, Filter, GmailMessage, ListFiltersResponse, ListLabelsResponse,
    ListMessagesResponse, MessageRef,
};
use crate::models::{Label, LabelId, MessageId};

/// In-memory implementation of MailApi
pub struct InMemoryMailApi {
    page_size: usize,
    search_results: RwLock<Vec<MessageRef>>,
    messages: RwLock<HashMap<String, GmailMessage>>,
    /// (message id, attachment id) -> base64 data
    attachments: RwLock<HashMap<(String, String), String>>,
    labels: RwLock<Vec<Label>>,
    filters: RwLock<Vec<Filter>>,
    /// Message id -> label ids currently applied
    message_labels: RwLock<HashMap<String, Vec<String>>>,
    /// Every query and page token passed to `list_messages`
    list_calls: RwLock<Vec<(String, Option<String>)>>,
    attachment_calls: RwLock<usize>,
}

impl InMemoryMailApi {
    /// Create an empty provider returning search pages of `page_size` refs
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            search_results: RwLock::new(Vec::new()),
            messages: RwLock::new(HashMap::new()),
            attachments: RwLock::new(HashMap::new()),
            labels: RwLock::new(Vec::new()),
            filters: RwLock::new(Vec::new()),
            message_labels: RwLock::new(HashMap::new()),
            list_calls: RwLock::new(Vec::new()),
            attachment_calls: RwLock::new(0),
        }
    }

    /// Add a message that every search will return
    pub fn add_message(&self, message: GmailMessage) {
        let labels = message.label_ids.clone().unwrap_or_default();
        self.search_results
            .write()
            .unwrap()
            .push(MessageRef {
                id: message.id.clone(),
                thread_id: message.thread_id.clone(),
            });
        self.message_labels
            .write()
            .unwrap()
            .insert(message.id.clone(), labels);
        self.messages
            .write()
            .unwrap()
            .insert(message.id.clone(), message);
    }

    /// Register an attachment body served by `get_attachment`
    pub fn add_attachment(&self, message_id: &str, attachment_id: &str, data: &str) {
        self.attachments.write().unwrap().insert(
            (message_id.to_string(), attachment_id.to_string()),
            data.to_string(),
        );
    }

    pub fn add_label(&self, label: Label) {
        self.labels.write().unwrap().push(label);
    }

    pub fn labels(&self) -> Vec<Label> {
        self.labels.read().unwrap().clone()
    }

    pub fn filters(&self) -> Vec<Filter> {
        self.filters.read().unwrap().clone()
    }

    /// Labels currently applied to a message
    pub fn message_labels(&self, id: &str) -> Vec<String> {
        self.message_labels
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Queries and page tokens seen by `list_messages`, in call order
    pub fn list_calls(&self) -> Vec<(String, Option<String>)> {
        self.list_calls.read().unwrap().clone()
    }

    pub fn attachment_calls(&self) -> usize {
        *self.attachment_calls.read().unwrap()
    }
}

impl Default for InMemoryMailApi {
    fn default() -> Self {
        Self::new(100)
    }
}

impl MailApi for InMemoryMailApi {
    fn list_messages(&self, query: &str, page_token: Option<&str>) -> Result<ListMessagesResponse> {
        self.list_calls
            .write()
            .unwrap()
            .push((query.to_string(), page_token.map(str::to_string)));

        let results = self.search_results.read().unwrap();
        let start: usize = match page_token {
            Some(token) => token.parse()?,
            None => 0,
        };
        let end = (start + self.page_size).min(results.len());
        let page: Vec<MessageRef> = results.get(start..end).unwrap_or_default().to_vec();

        Ok(ListMessagesResponse {
            messages: if page.is_empty() { None } else { Some(page) },
            next_page_token: (end < results.len()).then(|| end.to_string()),
            result_size_estimate: Some(results.len() as u32),
        })
    }

    fn get_message(&self, id: &MessageId) -> Result<GmailMessage> {
        match self.messages.read().unwrap().get(id.as_str()) {
            Some(message) => Ok(message.clone()),
            None => bail!("Message {} not found", id.as_str()),
        }
    }

    fn get_attachment(
        &self,
        message_id: &MessageId,
        attachment_id: &str,
    ) -> Result<AttachmentResponse> {
        *self.attachment_calls.write().unwrap() += 1;
        let data = self
            .attachments
            .read()
            .unwrap()
            .get(&(message_id.0.clone(), attachment_id.to_string()))
            .cloned();
        Ok(AttachmentResponse {
            size: data.as_ref().map(|d| d.len() as u32),
            data,
        })
    }

    fn list_labels(&self) -> Result<ListLabelsResponse> {
        Ok(ListLabelsResponse {
            labels: Some(self.labels()),
        })
    }

    fn create_label(&self, name: &str) -> Result<Label> {
        let mut labels = self.labels.write().unwrap();
        if labels.iter().any(|l| l.name == name) {
            bail!("Label name exists or conflicts");
        }
        let label = Label::new(format!("Label_{}", labels.len() + 1), name);
        labels.push(label.clone());
        Ok(label)
    }

    fn delete_label(&self, id: &LabelId) -> Result<()> {
        let mut labels = self.labels.write().unwrap();
        let before = labels.len();
        labels.retain(|l| l.id != *id);
        if labels.len() == before {
            bail!("Label {} not found", id.as_str());
        }
        Ok(())
    }

    fn create_filter(&self, filter: &Filter) -> Result<Filter> {
        let mut filters = self.filters.write().unwrap();
        let mut created = filter.clone();
        created.id = Some(format!("filter-{}", filters.len() + 1));
        filters.push(created.clone());
        Ok(created)
    }

    fn list_filters(&self) -> Result<ListFiltersResponse> {
        let filters = self.filters();
        Ok(ListFiltersResponse {
            filter: if filters.is_empty() { None } else { Some(filters) },
        })
    }

    fn modify_message(
        &self,
        id: &MessageId,
        add_label_ids: &[&str],
        remove_label_ids: &[&str],
    ) -> Result<()> {
        let mut all = self.message_labels.write().unwrap();
        let Some(labels) = all.get_mut(id.as_str()) else {
            bail!("Message {} not found", id.as_str());
        };
        labels.retain(|l| !remove_label_ids.contains(&l.as_str()));
        for add in add_label_ids {
            if !labels.iter().any(|l| l == add) {
                labels.push(add.to_string());
            }
        }
        Ok(())
    }
}
