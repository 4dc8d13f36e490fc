//! Message model representing a parsed Gmail message

use serde::{Deserialize, Serialize};

/// Unique identifier for a message (Gmail message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Attachment payloads keyed by filename.
///
/// Iteration follows insertion order. Inserting an existing filename
/// replaces the payload but keeps the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments(Vec<(String, Vec<u8>)>);

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, filename: impl Into<String>, data: Vec<u8>) {
        let filename = filename.into();
        match self.0.iter_mut().find(|(name, _)| *name == filename) {
            Some(slot) => slot.1 = data,
            None => self.0.push((filename, data)),
        }
    }

    pub fn get(&self, filename: &str) -> Option<&[u8]> {
        self.0
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, data)| data.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.0
            .iter()
            .map(|(name, data)| (name.as_str(), data.as_slice()))
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }
}

/// A message flattened into header fields, a plaintext body and attachments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Message-ID header, or a placeholder when the header is missing
    pub id: String,
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub date: Option<String>,
    /// Decoded plaintext body
    pub body: Option<String>,
    pub attachments: Attachments,
}

/// Serializable view of a [`ParsedMessage`], with attachments reduced to a count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageData {
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub date: Option<String>,
    pub body: Option<String>,
    pub attachments: usize,
}

impl ParsedMessage {
    /// Placeholder date text used when neither Message-ID nor Date is present
    pub const UNKNOWN_DATE: &'static str = "Unidentified (date unknown)";

    /// Build the placeholder identifier for a message without a Message-ID
    pub fn placeholder_id(date: Option<&str>) -> String {
        format!("Unidentified (sent '{}')", date.unwrap_or(Self::UNKNOWN_DATE))
    }

    pub fn data(&self) -> MessageData {
        MessageData {
            from: self.sender.clone(),
            to: self.recipient.clone(),
            subject: self.subject.clone(),
            date: self.date.clone(),
            body: self.body.clone(),
            attachments: self.attachments.len(),
        }
    }
}

/// Collect messages keyed by their id, later duplicates replacing earlier ones in place
pub fn dedupe_by_id(messages: impl IntoIterator<Item = ParsedMessage>) -> Vec<ParsedMessage> {
    let mut out: Vec<ParsedMessage> = Vec::new();
    for message in messages {
        match out.iter_mut().find(|m| m.id == message.id) {
            Some(slot) => *slot = message,
            None => out.push(message),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, subject: &str) -> ParsedMessage {
        ParsedMessage {
            id: id.to_string(),
            sender: Some("alice@example.com".to_string()),
            recipient: None,
            subject: Some(subject.to_string()),
            date: None,
            body: None,
            attachments: Attachments::new(),
        }
    }

    #[test]
    fn test_attachments_overwrite_keeps_position() {
        let mut attachments = Attachments::new();
        attachments.insert("a.txt", b"first".to_vec());
        attachments.insert("b.txt", b"second".to_vec());
        attachments.insert("a.txt", b"third".to_vec());

        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments.get("a.txt"), Some(&b"third"[..]));
        let names: Vec<&str> = attachments.filenames().collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_placeholder_id() {
        assert_eq!(
            ParsedMessage::placeholder_id(Some("Mon, 1 Jan 2024")),
            "Unidentified (sent 'Mon, 1 Jan 2024')"
        );
        assert_eq!(
            ParsedMessage::placeholder_id(None),
            "Unidentified (sent 'Unidentified (date unknown)')"
        );
    }

    #[test]
    fn test_data_counts_attachments() {
        let mut msg = message("<1@x>", "Hi");
        msg.attachments.insert("a.pdf", vec![1, 2, 3]);
        let data = msg.data();
        assert_eq!(data.attachments, 1);
        assert_eq!(data.subject.as_deref(), Some("Hi"));

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["From"], "alice@example.com");
        assert!(json["To"].is_null());
    }

    #[test]
    fn test_dedupe_by_id_last_wins() {
        let messages = dedupe_by_id(vec![
            message("a", "one"),
            message("b", "two"),
            message("a", "three"),
        ]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].subject.as_deref(), Some("three"));
        assert_eq!(messages[1].id, "b");
    }
}
