//! Gmail API integration
//!
//! This module provides:
//! - OAuth2 authentication flow
//! - Gmail API client behind the [`MailApi`] trait
//! - An in-memory [`MailApi`] for tests and offline use
//! - Extraction of headers, body and attachments from raw messages

mod auth;
mod client;
mod extract;
mod memory;
mod provider;

pub use auth::GmailAuth;
pub use client::GmailClient;
pub use extract::{
    BodyFormat, ExtractedFields, decode_base64, extract_fields, extract_header, parse_message,
};
pub use memory::InMemoryMailApi;
pub use provider::MailApi;

/// Gmail API request and response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing messages
    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
        pub next_page_token: Option<String>,
        pub result_size_estimate: Option<u32>,
    }

    /// Reference to a message (just ID and thread ID)
    #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageRef {
        pub id: String,
        #[serde(default)]
        pub thread_id: String,
    }

    impl MessageRef {
        pub fn new(id: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                thread_id: String::new(),
            }
        }
    }

    /// Full message from Gmail API
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: String,
        #[serde(default)]
        pub thread_id: String,
        pub label_ids: Option<Vec<String>>,
        #[serde(default)]
        pub snippet: String,
        pub payload: Option<MessagePart>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    impl Header {
        pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                value: value.into(),
            }
        }
    }

    /// Part body: inline data (URL-safe base64) or a reference to an attachment
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageBody {
        pub size: Option<u32>,
        pub data: Option<String>,
        pub attachment_id: Option<String>,
    }

    /// Message part. The top-level payload of a message is also a part.
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePart {
        pub part_id: Option<String>,
        pub mime_type: Option<String>,
        pub filename: Option<String>,
        pub headers: Option<Vec<Header>>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
    }

    /// Response from fetching an attachment
    #[derive(Debug, Default, Deserialize)]
    pub struct AttachmentResponse {
        pub size: Option<u32>,
        pub data: Option<String>,
    }

    /// Response from listing labels
    #[derive(Debug, Default, Deserialize)]
    pub struct ListLabelsResponse {
        pub labels: Option<Vec<crate::models::Label>>,
    }

    /// Filter criteria; only sender matching is used
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct FilterCriteria {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub from: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub query: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FilterAction {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub add_label_ids: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub remove_label_ids: Vec<String>,
    }

    /// A Gmail settings filter
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Filter {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub id: Option<String>,
        #[serde(default)]
        pub criteria: FilterCriteria,
        #[serde(default)]
        pub action: FilterAction,
    }

    /// Response from listing filters
    #[derive(Debug, Default, Deserialize)]
    pub struct ListFiltersResponse {
        pub filter: Option<Vec<Filter>>,
    }

    /// Body of a messages.modify request
    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ModifyMessageRequest<'a> {
        pub add_label_ids: &'a [&'a str],
        pub remove_label_ids: &'a [&'a str],
    }
}

#[cfg(test)]
mod tests {
    use super::api::*;

    #[test]
    fn test_deserialize_nested_message() {
        let json = r#"{
            "id": "18c",
            "threadId": "18c",
            "snippet": "hello",
            "payload": {
                "mimeType": "multipart/mixed",
                "headers": [{"name": "From", "value": "a@example.com"}],
                "body": {"size": 0},
                "parts": [
                    {"partId": "0", "mimeType": "text/plain", "filename": "",
                     "body": {"size": 5, "data": "aGVsbG8"}},
                    {"partId": "1", "mimeType": "application/pdf", "filename": "a.pdf",
                     "body": {"size": 9000, "attachmentId": "ANGj"}}
                ]
            }
        }"#;

        let message: GmailMessage = serde_json::from_str(json).unwrap();
        let payload = message.payload.unwrap();
        let parts = payload.parts.unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].body.as_ref().unwrap().attachment_id.as_deref(), Some("ANGj"));
        assert_eq!(parts[0].body.as_ref().unwrap().data.as_deref(), Some("aGVsbG8"));
    }

    #[test]
    fn test_serialize_filter_skips_empty_fields() {
        let filter = Filter {
            id: None,
            criteria: FilterCriteria {
                from: Some("{from: a@x.com}".to_string()),
                query: None,
            },
            action: FilterAction {
                add_label_ids: vec!["Label_1".to_string()],
                remove_label_ids: Vec::new(),
            },
        };
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "criteria": {"from": "{from: a@x.com}"},
                "action": {"addLabelIds": ["Label_1"]}
            })
        );
    }
}
