//! Provider trait for the Gmail REST surface used by gmailtools

use anyhow::Result;

use super::api::{
    AttachmentResponse, Filter, GmailMessage, ListFiltersResponse, ListLabelsResponse,
    ListMessagesResponse,
};
use crate::models::{Label, LabelId, MessageId};

/// Operations against a mail provider account.
///
/// [`GmailClient`](super::GmailClient) talks to the Gmail API;
/// [`InMemoryMailApi`](super::InMemoryMailApi) serves canned data.
pub trait MailApi: Send + Sync {
    /// Fetch one page of message references matching `query`
    fn list_messages(&self, query: &str, page_token: Option<&str>) -> Result<ListMessagesResponse>;

    /// Fetch the full nested structure of a message
    fn get_message(&self, id: &MessageId) -> Result<GmailMessage>;

    /// Fetch an attachment body that was not sent inline
    fn get_attachment(
        &self,
        message_id: &MessageId,
        attachment_id: &str,
    ) -> Result<AttachmentResponse>;

    fn list_labels(&self) -> Result<ListLabelsResponse>;

    fn create_label(&self, name: &str) -> Result<Label>;

    fn delete_label(&self, id: &LabelId) -> Result<()>;

    fn create_filter(&self, filter: &Filter) -> Result<Filter>;

    fn list_filters(&self) -> Result<ListFiltersResponse>;

    /// Add and remove labels on a single message
    fn modify_message(
        &self,
        id: &MessageId,
        add_label_ids: &[&str],
        remove_label_ids: &[&str],
    ) -> Result<()>;
}
