//! Gmail API HTTP client
//!
//! Provides the [`MailApi`] operations against the Gmail REST API.
//! Uses synchronous HTTP (ureq) to be executor-agnostic. Requests are
//! not retried; failures surface to the caller as they happen.

use anyhow::{Context, Result};
use log::debug;
use serde::de::DeserializeOwned;

use super::api::{
    AttachmentResponse, Filter, GmailMessage, ListFiltersResponse, ListLabelsResponse,
    ListMessagesResponse, ModifyMessageRequest,
};
use super::{GmailAuth, MailApi};
use crate::models::{Label, LabelId, MessageId};

/// Gmail API client
pub struct GmailClient {
    auth: GmailAuth,
}

impl GmailClient {
    /// Gmail API base URL
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Largest page `messages.list` will return
    pub const MAX_PAGE_SIZE: usize = 500;

    /// Create a new Gmail client
    pub fn new(auth: GmailAuth) -> Self {
        Self { auth }
    }

    /// Trigger authentication flow
    pub fn authenticate(&self) -> Result<()> {
        self.auth.get_access_token()?;
        Ok(())
    }

    fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.auth.get_access_token()?))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let mut response = ureq::get(url)
            .header("Authorization", &self.bearer()?)
            .call()
            .with_context(|| format!("Failed to send {} request", what))?;

        response
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse {} response", what))
    }

    fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        what: &str,
    ) -> Result<T> {
        let mut response = ureq::post(url)
            .header("Authorization", &self.bearer()?)
            .send_json(body)
            .with_context(|| format!("Failed to send {} request", what))?;

        response
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse {} response", what))
    }
}

impl MailApi for GmailClient {
    /// List message IDs matching a query
    ///
    /// # Arguments
    /// * `query` - Gmail search query (the `q` parameter)
    /// * `page_token` - Optional page token for pagination
    fn list_messages(&self, query: &str, page_token: Option<&str>) -> Result<ListMessagesResponse> {
        let mut url = format!(
            "{}/users/me/messages?maxResults={}&q={}",
            Self::BASE_URL,
            Self::MAX_PAGE_SIZE,
            urlencoding::encode(query)
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        debug!("Listing messages for {:?} (page token {:?})", query, page_token);
        self.get_json(&url, "list messages")
    }

    /// Get full message details by ID
    fn get_message(&self, id: &MessageId) -> Result<GmailMessage> {
        let url = format!(
            "{}/users/me/messages/{}?format=full",
            Self::BASE_URL,
            id.as_str()
        );
        self.get_json(&url, "get message")
    }

    fn get_attachment(
        &self,
        message_id: &MessageId,
        attachment_id: &str,
    ) -> Result<AttachmentResponse> {
        let url = format!(
            "{}/users/me/messages/{}/attachments/{}",
            Self::BASE_URL,
            message_id.as_str(),
            attachment_id
        );
        self.get_json(&url, "get attachment")
    }

    /// List all labels in the user's mailbox
    fn list_labels(&self) -> Result<ListLabelsResponse> {
        let url = format!("{}/users/me/labels", Self::BASE_URL);
        self.get_json(&url, "list labels")
    }

    fn create_label(&self, name: &str) -> Result<Label> {
        let url = format!("{}/users/me/labels", Self::BASE_URL);
        self.post_json(&url, &serde_json::json!({ "name": name }), "create label")
    }

    fn delete_label(&self, id: &LabelId) -> Result<()> {
        let url = format!("{}/users/me/labels/{}", Self::BASE_URL, id.as_str());
        ureq::delete(&url)
            .header("Authorization", &self.bearer()?)
            .call()
            .with_context(|| {
                format!(
                    "Error deleting label. Make sure the label {} exists",
                    id.as_str()
                )
            })?;
        Ok(())
    }

    fn create_filter(&self, filter: &Filter) -> Result<Filter> {
        let url = format!("{}/users/me/settings/filters", Self::BASE_URL);
        self.post_json(&url, filter, "create filter")
    }

    /// List all filters active in the account
    fn list_filters(&self) -> Result<ListFiltersResponse> {
        let url = format!("{}/users/me/settings/filters", Self::BASE_URL);
        self.get_json(&url, "list filters")
    }

    fn modify_message(
        &self,
        id: &MessageId,
        add_label_ids: &[&str],
        remove_label_ids: &[&str],
    ) -> Result<()> {
        let url = format!("{}/users/me/messages/{}/modify", Self::BASE_URL, id.as_str());
        let body = ModifyMessageRequest {
            add_label_ids,
            remove_label_ids,
        };
        let _: GmailMessage = self.post_json(&url, &body, "modify message")?;
        Ok(())
    }
}
