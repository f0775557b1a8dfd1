use serde::{Deserialize, Serialize};

use super::attachment::{FileDescriptor, Reference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub content: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_replies: Option<Vec<String>>,
}

impl Message {
    pub fn user(content: impl Into<String>, files: Vec<FileDescriptor>) -> Self {
        Self {
            id: super::new_id(),
            kind: MessageType::User,
            content: content.into(),
            timestamp: super::now_millis(),
            files: if files.is_empty() { None } else { Some(files) },
            references: None,
            quick_replies: None,
        }
    }

    pub fn ai(
        content: impl Into<String>,
        references: Vec<Reference>,
        quick_replies: Vec<String>,
    ) -> Self {
        Self {
            id: super::new_id(),
            kind: MessageType::Ai,
            content: content.into(),
            timestamp: super::now_millis(),
            files: None,
            references: Some(references),
            quick_replies: Some(quick_replies),
        }
    }
}
