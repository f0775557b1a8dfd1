use std::time::Duration;

pub const APP_ID: &str = "com.docudesk.DocuDesk";
pub const APP_NAME: &str = "DocuDesk";

/// Storage key holding the JSON array of conversations.
pub const CONVERSATIONS_KEY: &str = "chat_conversations";
/// Prefix for per-conversation message keys; the conversation id is appended.
pub const MESSAGES_KEY_PREFIX: &str = "chat_messages_";
pub const SETTINGS_KEY: &str = "app_settings";
pub const AUTH_USER_KEY: &str = "auth_user";

pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1200);

pub const DEFAULT_CONVERSATION_ID: &str = "1";
pub const DEFAULT_CONVERSATION_NAME: &str = "New Chat";
/// Name used when a conversation is created from a message with no words.
pub const FALLBACK_CONVERSATION_NAME: &str = "Chat";
pub const NAME_WORD_LIMIT: usize = 4;

pub fn messages_key(conversation_id: &str) -> String {
    format!("{}{}", MESSAGES_KEY_PREFIX, conversation_id)
}
