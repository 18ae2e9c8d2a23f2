//! Validation utilities.

use crate::types::{ChatError, ChatResult};

/// Validation utilities
pub struct Validator;

impl Validator {
    /// Validate a conversation id
    pub fn conversation_id(id: &str) -> ChatResult<()> {
        if id.trim().is_empty() {
            return Err(ChatError::validation("Conversation id cannot be empty"));
        }

        if id.len() > 255 {
            return Err(ChatError::validation(
                "Conversation id too long (max 255 characters)",
            ));
        }

        Ok(())
    }

    /// Validate a participant id
    pub fn participant_id(id: &str) -> ChatResult<()> {
        if id.trim().is_empty() {
            return Err(ChatError::validation("Participant id cannot be empty"));
        }

        Ok(())
    }

    /// Validate message text against the given length cap
    pub fn message_text(text: &str, max_length: usize) -> ChatResult<()> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        if text.len() > max_length {
            return Err(ChatError::validation(format!(
                "Message too long (max {max_length} characters)"
            )));
        }

        Ok(())
    }
}
