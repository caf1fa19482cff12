//! Direct messages with realtime push

pub mod model;
mod service;

pub use model::{ChatMessage, ConversationSummary, SendMessageRequest, UnreadMessages};
pub use service::ChatService;
