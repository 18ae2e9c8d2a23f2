//! The transport seam: the contract a concrete publish/subscribe channel
//! implements for the session.
//!
//! Calls are issue-and-return: they enqueue work with the channel and must
//! not block. Results of a subscribe (backfill, pushes, failures) arrive
//! later as [`crate::ConversationEvent`]s.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported synchronously by a transport call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Transport connection closed")]
    Closed,

    #[error("Request rejected by transport: {reason}")]
    Rejected { reason: String },

    #[error("Transport I/O error: {message}")]
    Io { message: String },
}

impl TransportError {
    /// Create a rejection error
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

/// Opaque token identifying one subscription.
///
/// The transport mints a fresh token per subscribe call and scopes every
/// inbound event to it, so the session can tell live events from stale ones
/// after a conversation switch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionToken(String);

impl SubscriptionToken {
    /// Wrap an existing token value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mint a fresh random token
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the token value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The outbound message payload handed to the transport on submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Conversation the message belongs to
    pub conversation_id: String,
    /// Message body
    pub text: String,
    /// Participant id of the sender
    pub author_id: String,
}

/// A publish/subscribe channel keyed by conversation id.
///
/// Implementations deliver inbound events through whatever notification
/// mechanism fits them (polled queue, channel receiver); the session only
/// requires that calls return without blocking.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Subscribe to a conversation; the backfill arrives later as an event
    fn subscribe(
        &mut self,
        conversation_id: &str,
        participant_id: &str,
    ) -> Result<SubscriptionToken, TransportError>;

    /// Transmit a message; acceptance, not delivery confirmation
    fn send_message(&mut self, outbound: &OutboundMessage) -> Result<(), TransportError>;

    /// Tear down a subscription
    fn unsubscribe(&mut self, token: &SubscriptionToken) -> Result<(), TransportError>;
}
