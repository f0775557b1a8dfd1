//! Conversation, message and session state behind the DocuDesk document
//! assistant. Everything is kept in a local key/value store; assistant
//! replies are simulated.

pub mod config;
pub mod models;
pub mod services;
