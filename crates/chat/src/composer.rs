//! Message composer: draft buffer, mention trigger detection, and mention
//! resolution at finalize time.

use std::collections::BTreeSet;

use crate::entities::{DraftMessage, Participant};
use crate::mentions::MentionIndex;
use crate::types::ChatResult;
use crate::utils::Validator;

/// Default cap on message length, matching the backend's limit
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 100_000;

/// The mention trigger character
const TRIGGER: char = '@';

/// Owns the draft text for one conversation and tracks the active mention
/// trigger.
///
/// The caret is assumed to sit at the end of the buffer: the *last* `@` in
/// the text is the active trigger iff no whitespace follows it, which is the
/// natural shape of left-to-right typing. The trigger and its search prefix
/// are recomputed from scratch on every text change and never persisted.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    buffer: String,
    trigger_start: Option<usize>,
    max_length: usize,
}

impl Default for MessageComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageComposer {
    /// Create a composer with the default length limit
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_MESSAGE_LENGTH)
    }

    /// Create a composer with a custom length limit
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            buffer: String::new(),
            trigger_start: None,
            max_length,
        }
    }

    /// Get the current draft text
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Check whether a mention trigger is active
    pub fn trigger_active(&self) -> bool {
        self.trigger_start.is_some()
    }

    /// Get the active search prefix (the text after the trigger `@`)
    pub fn active_prefix(&self) -> Option<&str> {
        self.trigger_start.map(|at| &self.buffer[at + 1..])
    }

    /// Replace the draft text and recompute the trigger state.
    ///
    /// Only the last `@` can be active; any whitespace between it and the
    /// end of the text terminates the trigger.
    pub fn on_text_changed(&mut self, new_text: &str) {
        self.buffer.clear();
        self.buffer.push_str(new_text);

        self.trigger_start = match self.buffer.rfind(TRIGGER) {
            Some(at) if !self.buffer[at + 1..].chars().any(char::is_whitespace) => Some(at),
            _ => None,
        };
    }

    /// Accept a suggestion: replace everything from the trigger `@` to the
    /// end of the buffer with the rendered mention plus a trailing space.
    ///
    /// A call with no active trigger is a silent no-op; that contract is
    /// caller discipline, not a runtime error.
    pub fn on_mention_selected(&mut self, participant: &Participant) {
        let Some(at) = self.trigger_start.take() else {
            return;
        };

        self.buffer.truncate(at);
        self.buffer.push(TRIGGER);
        self.buffer.push_str(&participant.display_name);
        self.buffer.push(' ');
    }

    /// Produce the finalized draft without clearing the buffer.
    ///
    /// Mention resolution is purely textual: every known participant whose
    /// rendered mention (`@` + display name, case-sensitive) appears in the
    /// buffer is collected, so a name that is a prefix of another matches
    /// whenever its substring is present. The caller clears the buffer only
    /// after the transport accepts the send.
    pub fn finalize(&self, index: &MentionIndex) -> ChatResult<DraftMessage> {
        Validator::message_text(&self.buffer, self.max_length)?;

        let mut resolved_mentions = BTreeSet::new();
        for participant in index.participants() {
            let rendered = format!("{TRIGGER}{}", participant.display_name);
            if self.buffer.contains(&rendered) {
                resolved_mentions.insert(participant.id.clone());
            }
        }

        Ok(DraftMessage {
            text: self.buffer.clone(),
            resolved_mentions,
        })
    }

    /// Discard the draft and any trigger state
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.trigger_start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatError;

    fn index() -> MentionIndex {
        MentionIndex::with_participants(vec![
            Participant::new("1", "Bob"),
            Participant::new("2", "Bobby"),
            Participant::new("3", "Sarah Johnson"),
        ])
    }

    #[test]
    fn test_trigger_activates_on_unterminated_mention() {
        let mut composer = MessageComposer::new();

        composer.on_text_changed("hello @Sa");

        assert!(composer.trigger_active());
        assert_eq!(composer.active_prefix(), Some("Sa"));
    }

    #[test]
    fn test_trigger_deactivates_after_whitespace() {
        let mut composer = MessageComposer::new();

        composer.on_text_changed("hello @Sarah Johnson is great");

        assert!(!composer.trigger_active());
        assert_eq!(composer.active_prefix(), None);
    }

    #[test]
    fn test_only_last_unterminated_trigger_is_active() {
        let mut composer = MessageComposer::new();

        composer.on_text_changed("@Bob please ping @Sa");

        assert_eq!(composer.active_prefix(), Some("Sa"));
    }

    #[test]
    fn test_bare_trigger_yields_empty_prefix() {
        let mut composer = MessageComposer::new();

        composer.on_text_changed("hello @");

        assert!(composer.trigger_active());
        assert_eq!(composer.active_prefix(), Some(""));
    }

    #[test]
    fn test_whitespace_directly_after_trigger_deactivates() {
        let mut composer = MessageComposer::new();

        composer.on_text_changed("hello @ there");
        assert!(!composer.trigger_active());

        composer.on_text_changed("hello @\n");
        assert!(!composer.trigger_active());
    }

    #[test]
    fn test_no_trigger_without_at() {
        let mut composer = MessageComposer::new();

        composer.on_text_changed("hello there");

        assert!(!composer.trigger_active());
    }

    #[test]
    fn test_mention_selection_rewrites_tail() {
        let mut composer = MessageComposer::new();
        composer.on_text_changed("hello @Sa");

        composer.on_mention_selected(&Participant::new("3", "Sarah Johnson"));

        assert_eq!(composer.buffer(), "hello @Sarah Johnson ");
        assert!(!composer.trigger_active());
    }

    #[test]
    fn test_mention_selection_without_trigger_is_noop() {
        let mut composer = MessageComposer::new();
        composer.on_text_changed("hello there");

        composer.on_mention_selected(&Participant::new("3", "Sarah Johnson"));

        assert_eq!(composer.buffer(), "hello there");
    }

    #[test]
    fn test_finalize_resolves_exact_rendered_mentions() {
        let mut composer = MessageComposer::new();
        composer.on_text_changed("@Bob please review");

        let draft = composer.finalize(&index()).unwrap();

        // "Bobby" is not a substring of the buffer, so only Bob matches.
        assert_eq!(
            draft.resolved_mentions,
            ["1".to_string()].into_iter().collect()
        );
    }

    #[test]
    fn test_finalize_prefix_names_both_match() {
        let mut composer = MessageComposer::new();
        composer.on_text_changed("@Bobby and @Bob");

        let draft = composer.finalize(&index()).unwrap();

        // "@Bob" is a substring of "@Bobby", so both resolve. Accepted
        // behavior of textual matching, pinned here on purpose.
        assert_eq!(
            draft.resolved_mentions,
            ["1".to_string(), "2".to_string()].into_iter().collect()
        );
    }

    #[test]
    fn test_finalize_dedupes_repeated_mentions() {
        let mut composer = MessageComposer::new();
        composer.on_text_changed("@Bob and @Bob again");

        let draft = composer.finalize(&index()).unwrap();

        assert_eq!(draft.resolved_mentions.len(), 1);
    }

    #[test]
    fn test_finalize_rejects_blank_buffer() {
        let mut composer = MessageComposer::new();
        composer.on_text_changed("   \n\t ");

        assert_eq!(composer.finalize(&index()), Err(ChatError::EmptyMessage));
    }

    #[test]
    fn test_finalize_rejects_oversized_buffer() {
        let mut composer = MessageComposer::with_max_length(16);
        composer.on_text_changed("this draft is longer than sixteen chars");

        let error = composer.finalize(&index()).unwrap_err();
        assert!(matches!(error, ChatError::Validation { .. }));
    }

    #[test]
    fn test_finalize_keeps_buffer() {
        let mut composer = MessageComposer::new();
        composer.on_text_changed("@Bob please review");

        let _ = composer.finalize(&index()).unwrap();

        assert_eq!(composer.buffer(), "@Bob please review");
    }

    #[test]
    fn test_mention_is_case_sensitive_at_finalize() {
        let mut composer = MessageComposer::new();
        composer.on_text_changed("@bob please review");

        let draft = composer.finalize(&index()).unwrap();

        assert!(draft.resolved_mentions.is_empty());
    }
}
