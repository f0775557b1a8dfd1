pub mod attachment;
pub mod conversation;
pub mod message;
pub mod user;

pub use attachment::{FileDescriptor, PendingFile, Reference};
pub use conversation::Conversation;
pub use message::{Message, MessageType};
pub use user::{Permission, Role, User};

use chrono::Utc;
use uuid::Uuid;

/// Time-ordered unique id.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
