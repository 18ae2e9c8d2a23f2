//! Shared types for the chat core.

pub mod errors;
pub mod events;

pub use errors::{ChatError, ChatResult};
pub use events::{ConversationEvent, EventOutcome};
