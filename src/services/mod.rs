pub mod auth;
pub mod chat;
pub mod conversation;
pub mod export;
pub mod guard;
pub mod messages;
pub mod persistence;
pub mod settings;
pub mod storage;

pub use auth::{AuthBackend, AuthService, MockAuthBackend};
pub use chat::{ChatError, ChatEvent, ChatService};
pub use persistence::Persistence;
pub use settings::SettingsService;
pub use storage::Storage;
