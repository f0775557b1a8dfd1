use serde::{Deserialize, Serialize};

/// A file picked in the input area, before it is sent.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// What a sent message keeps of an attachment. Contents are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub size: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl From<&PendingFile> for FileDescriptor {
    fn from(file: &PendingFile) -> Self {
        Self {
            name: file.name.clone(),
            size: file.size.to_string(),
            mime_type: file.mime_type.clone(),
        }
    }
}

/// A document cited by an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}
