//! Mention index: prefix search over the conversation roster.

use crate::entities::Participant;
use crate::types::{ChatError, ChatResult};

/// Maintains the set of addressable participants for one conversation and
/// answers autocomplete queries against it.
///
/// The roster is replaced wholesale on every conversation switch; search
/// results preserve the input list order rather than ranking by relevance.
#[derive(Debug, Clone, Default)]
pub struct MentionIndex {
    participants: Vec<Participant>,
}

impl MentionIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index over the given roster
    pub fn with_participants(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    /// Replace the roster
    pub fn refresh(&mut self, participants: Vec<Participant>) {
        self.participants = participants;
    }

    /// Get the current roster, in input order
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Number of known participants
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Check whether the roster is empty
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Search the roster by display name.
    ///
    /// Matches case-insensitively anywhere in the name. An empty prefix is
    /// valid and returns the full roster; a missing one (`None`) fails with
    /// [`ChatError::InvalidInput`]. No side effects.
    pub fn search(&self, prefix: Option<&str>) -> ChatResult<Vec<&Participant>> {
        let prefix = prefix.ok_or_else(|| ChatError::invalid_input("search prefix is required"))?;

        let needle = prefix.to_lowercase();
        Ok(self
            .participants
            .iter()
            .filter(|participant| participant.display_name.to_lowercase().contains(&needle))
            .collect())
    }
}
