//! Message stream: the ordered, deduplicated log for one conversation.

use std::collections::{HashMap, HashSet};

use crate::entities::Message;

/// Append-only message log ordered by `created_at` ascending, ties broken by
/// arrival order, deduplicated by backend-assigned id.
///
/// The stream merges one backfill batch with incrementally pushed updates;
/// entries are never mutated in place and are discarded only when the owning
/// conversation is torn down.
#[derive(Debug, Clone, Default)]
pub struct MessageStream {
    messages: Vec<Message>,
    ids: HashSet<String>,
}

impl MessageStream {
    /// Create an empty stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a backfill batch.
    ///
    /// Duplicate ids within the batch collapse to the last occurrence, then
    /// the batch is stable-sorted by timestamp so equal timestamps keep
    /// their batch order. Idempotent: reloading the same batch yields the
    /// same state.
    pub fn load_backfill(&mut self, batch: Vec<Message>) {
        let mut deduped: Vec<Message> = Vec::with_capacity(batch.len());
        let mut slots: HashMap<String, usize> = HashMap::new();

        for message in batch {
            match slots.get(&message.id) {
                Some(&slot) => deduped[slot] = message,
                None => {
                    slots.insert(message.id.clone(), deduped.len());
                    deduped.push(message);
                }
            }
        }

        deduped.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        self.ids = deduped.iter().map(|m| m.id.clone()).collect();
        self.messages = deduped;
    }

    /// Insert a pushed message at its sorted position.
    ///
    /// A message whose id is already present is a no-op and the stored entry
    /// is retained unchanged: backend-assigned ids are authoritative, so the
    /// first write wins. Returns whether the message was inserted.
    pub fn append(&mut self, message: Message) -> bool {
        if self.ids.contains(&message.id) {
            return false;
        }

        // After all equal timestamps, preserving arrival order on ties.
        let at = self
            .messages
            .partition_point(|existing| existing.created_at <= message.created_at);

        self.ids.insert(message.id.clone());
        self.messages.insert(at, message);
        true
    }

    /// Read-only ordered snapshot of the log
    pub fn current_view(&self) -> &[Message] {
        &self.messages
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Discard all contents
    pub fn clear(&mut self) {
        self.messages.clear();
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn message(id: &str, secs: i64, nanos: u32) -> Message {
        Message::new(
            id,
            "u-1",
            "Sarah Johnson",
            format!("message {id}"),
            DateTime::<Utc>::from_timestamp(secs, nanos).unwrap(),
        )
    }

    fn view_ids(stream: &MessageStream) -> Vec<&str> {
        stream
            .current_view()
            .iter()
            .map(|m| m.id.as_str())
            .collect()
    }

    #[test]
    fn test_backfill_sorts_by_timestamp() {
        let mut stream = MessageStream::new();

        stream.load_backfill(vec![
            message("b", 2, 0),
            message("a", 1, 0),
            message("c", 3, 0),
        ]);

        assert_eq!(view_ids(&stream), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_backfill_ties_keep_batch_order() {
        let mut stream = MessageStream::new();

        stream.load_backfill(vec![
            message("x", 1, 0),
            message("y", 1, 0),
            message("z", 1, 0),
        ]);

        assert_eq!(view_ids(&stream), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_backfill_dedupes_last_occurrence_wins() {
        let mut stream = MessageStream::new();

        let mut updated = message("a", 1, 0);
        updated.text = "second copy".to_string();

        stream.load_backfill(vec![message("a", 1, 0), message("b", 2, 0), updated]);

        assert_eq!(stream.len(), 2);
        assert_eq!(stream.current_view()[0].text, "second copy");
    }

    #[test]
    fn test_backfill_is_idempotent() {
        let batch = vec![message("a", 1, 0), message("b", 2, 0)];
        let mut stream = MessageStream::new();

        stream.load_backfill(batch.clone());
        let first = stream.current_view().to_vec();

        stream.load_backfill(batch);
        assert_eq!(stream.current_view(), first.as_slice());
    }

    #[test]
    fn test_backfill_replaces_prior_contents() {
        let mut stream = MessageStream::new();
        stream.load_backfill(vec![message("a", 1, 0)]);

        stream.load_backfill(vec![message("b", 2, 0)]);

        assert_eq!(view_ids(&stream), vec!["b"]);
    }

    #[test]
    fn test_append_duplicate_id_is_noop() {
        let mut stream = MessageStream::new();
        stream.load_backfill(vec![message("a", 1, 0), message("b", 2, 0)]);

        let mut replay = message("a", 1, 0);
        replay.text = "tampered".to_string();

        assert!(!stream.append(replay));
        assert_eq!(view_ids(&stream), vec!["a", "b"]);
        assert_eq!(stream.current_view()[0].text, "message a");
    }

    #[test]
    fn test_append_inserts_between_neighbors() {
        let mut stream = MessageStream::new();
        stream.load_backfill(vec![message("a", 1, 0), message("b", 2, 0)]);

        assert!(stream.append(message("c", 1, 500_000_000)));

        assert_eq!(view_ids(&stream), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_append_equal_timestamp_lands_after_existing() {
        let mut stream = MessageStream::new();
        stream.load_backfill(vec![message("a", 1, 0)]);

        stream.append(message("b", 1, 0));

        assert_eq!(view_ids(&stream), vec!["a", "b"]);
    }

    #[test]
    fn test_clear_empties_the_log() {
        let mut stream = MessageStream::new();
        stream.load_backfill(vec![message("a", 1, 0)]);

        stream.clear();

        assert!(stream.is_empty());
        // A cleared id may be reused by a later subscription's history.
        assert!(stream.append(message("a", 1, 0)));
    }
}
