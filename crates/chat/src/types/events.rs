//! Event types for real-time conversation updates.

use serde::{Deserialize, Serialize};

use crate::entities::Message;
use crate::transport::SubscriptionToken;

/// An inbound transport event, scoped to one subscription.
///
/// Every event carries the subscription token it was delivered under; the
/// session compares it against the active handle and silently discards
/// events for torn-down subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConversationEvent {
    /// Initial bulk history, delivered once per subscribe
    BackfillReceived {
        token: SubscriptionToken,
        messages: Vec<Message>,
    },

    /// A single new message, delivered while subscribed
    MessagePushed {
        token: SubscriptionToken,
        message: Message,
    },

    /// Advisory user-facing notice; never part of stream state
    MentionNotice {
        token: SubscriptionToken,
        text: String,
    },

    /// The transport could not establish the subscription
    SubscribeFailed {
        token: SubscriptionToken,
        reason: String,
    },
}

impl ConversationEvent {
    /// Get the subscription token this event is scoped to
    pub fn token(&self) -> &SubscriptionToken {
        match self {
            ConversationEvent::BackfillReceived { token, .. }
            | ConversationEvent::MessagePushed { token, .. }
            | ConversationEvent::MentionNotice { token, .. }
            | ConversationEvent::SubscribeFailed { token, .. } => token,
        }
    }

    /// Get event type name for logging
    pub fn event_type_name(&self) -> &'static str {
        match self {
            ConversationEvent::BackfillReceived { .. } => "backfill_received",
            ConversationEvent::MessagePushed { .. } => "message_pushed",
            ConversationEvent::MentionNotice { .. } => "mention_notice",
            ConversationEvent::SubscribeFailed { .. } => "subscribe_failed",
        }
    }
}

/// What the session did with an inbound event.
///
/// Callers use this to drive UI reactions without observing session
/// internals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event mutated the message stream
    Applied,
    /// Push arrived before backfill and was queued for replay
    Queued,
    /// Backfill loaded; `replayed` queued pushes were applied after it
    BackfillLoaded { replayed: usize },
    /// Push carried an id the stream already holds; existing entry retained
    Duplicate,
    /// Stale or unscoped event, dropped without effect
    Discarded,
    /// Advisory mention notice for the local participant
    Notice(String),
}
