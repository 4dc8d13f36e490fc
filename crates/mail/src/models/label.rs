//! Label model representing a Gmail label

use serde::{Deserialize, Serialize};

/// Unique identifier for a label (Gmail label ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelId(pub String);

impl LabelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Well-known Gmail system labels
    pub const INBOX: &'static str = "INBOX";
    pub const UNREAD: &'static str = "UNREAD";
}

impl From<String> for LabelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LabelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A mail label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label ID (e.g., "INBOX", "Label_123")
    pub id: LabelId,
    /// Display name
    pub name: String,
    /// Whether this is a system label
    #[serde(default, rename = "type", with = "label_type")]
    pub is_system: bool,
}

impl Label {
    /// Create a new user label
    pub fn new(id: impl Into<LabelId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_system: false,
        }
    }

    /// Create a system label
    pub fn system(id: impl Into<LabelId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_system: true,
        }
    }
}

/// Gmail reports the label kind as `"system"` or `"user"`
mod label_type {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(is_system: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(if *is_system { "system" } else { "user" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let kind = String::deserialize(d)?;
        Ok(kind == "system")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_gmail_label() {
        let json = r#"{"id": "Label_7", "name": "Students", "type": "user"}"#;
        let label: Label = serde_json::from_str(json).unwrap();
        assert_eq!(label, Label::new("Label_7", "Students"));

        let json = r#"{"id": "INBOX", "name": "INBOX", "type": "system"}"#;
        let label: Label = serde_json::from_str(json).unwrap();
        assert!(label.is_system);
    }

    #[test]
    fn test_missing_type_defaults_to_user() {
        let label: Label = serde_json::from_str(r#"{"id": "L", "name": "n"}"#).unwrap();
        assert!(!label.is_system);
    }
}
