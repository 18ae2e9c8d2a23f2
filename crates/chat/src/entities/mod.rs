//! Domain entities for the chat core.

pub mod message;
pub mod participant;

pub use message::{DraftMessage, Message};
pub use participant::Participant;
