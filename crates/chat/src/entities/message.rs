use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChatError, ChatResult};

/// A message within a conversation.
///
/// Messages are created only at the transport boundary (backfill or push)
/// and are never mutated after insertion; the backend-assigned `id` is
/// authoritative and globally unique within a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Backend-assigned unique identifier
    pub id: String,
    /// Participant id of the author
    pub author_id: String,
    /// Author display name as rendered at send time
    pub author_display_name: String,
    /// Message body
    pub text: String,
    /// Creation timestamp, assigned by the backend
    pub created_at: DateTime<Utc>,
    /// Participant ids mentioned in the body
    pub mentions: BTreeSet<String>,
}

impl Message {
    /// Create a new message instance with an empty mention set
    pub fn new(
        id: impl Into<String>,
        author_id: impl Into<String>,
        author_display_name: impl Into<String>,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            author_display_name: author_display_name.into(),
            text: text.into(),
            created_at,
            mentions: BTreeSet::new(),
        }
    }

    /// Attach a resolved mention set
    pub fn with_mentions(mut self, mentions: BTreeSet<String>) -> Self {
        self.mentions = mentions;
        self
    }

    /// Check whether the given participant is mentioned
    pub fn mentions_participant(&self, participant_id: &str) -> bool {
        self.mentions.contains(participant_id)
    }

    /// Validate message data
    pub fn validate(&self) -> ChatResult<()> {
        if self.id.trim().is_empty() {
            return Err(ChatError::validation("Message id cannot be empty"));
        }

        if self.author_id.trim().is_empty() {
            return Err(ChatError::validation("Message author cannot be empty"));
        }

        Ok(())
    }
}

/// A composer-held draft: the not-yet-submitted text plus its extracted
/// mention set. Ownership transfers to the session on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftMessage {
    /// Draft body, exactly as composed
    pub text: String,
    /// Ids of participants whose rendered mention appears in the body
    pub resolved_mentions: BTreeSet<String>,
}
