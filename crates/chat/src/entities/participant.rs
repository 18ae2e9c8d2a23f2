use serde::{Deserialize, Serialize};

use crate::types::{ChatError, ChatResult};

/// An addressable member of a conversation.
///
/// Participants come from the project membership list and are immutable once
/// fetched; the roster is replaced wholesale when the active conversation
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Unique participant identifier, assigned by the backend
    pub id: String,
    /// Human-readable name shown in mentions and message headers
    pub display_name: String,
}

impl Participant {
    /// Create a new participant instance
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// Validate participant data
    pub fn validate(&self) -> ChatResult<()> {
        if self.id.trim().is_empty() {
            return Err(ChatError::validation("Participant id cannot be empty"));
        }

        if self.display_name.trim().is_empty() {
            return Err(ChatError::validation(
                "Participant display name cannot be empty",
            ));
        }

        if self.display_name.len() > 255 {
            return Err(ChatError::validation(
                "Participant display name too long (max 255 characters)",
            ));
        }

        Ok(())
    }
}
