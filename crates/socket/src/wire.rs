//! Wire protocol: tagged JSON frames exchanged with the messaging backend.
//!
//! Every inbound payload is validated into the typed entities of the chat
//! core at this boundary; any shape or timestamp failure is a
//! [`SocketError::MalformedPayload`], never a partially-filled entity.

use std::collections::BTreeSet;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use teamline_chat::{ConversationEvent, Message, SubscriptionToken};

use crate::error::{SocketError, SocketResult};

/// Frames sent by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Heartbeat to keep the connection alive
    Ping,
    /// Subscribe to conversation events; the client mints the token and the
    /// server echoes it on every scoped frame
    Subscribe {
        conversation_id: String,
        participant_id: String,
        token: String,
    },
    /// Tear down a subscription
    Unsubscribe { token: String },
    /// Send a message
    SendMessage {
        conversation_id: String,
        text: String,
        author_id: String,
    },
}

/// Frames sent by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Heartbeat response
    Pong,
    /// Subscription confirmation
    Subscribed { conversation_id: String, token: String },
    /// The subscription could not be established
    SubscribeFailed {
        conversation_id: String,
        token: String,
        reason: String,
    },
    /// Initial history, delivered once per subscribe
    Backfill {
        conversation_id: String,
        token: String,
        messages: Vec<MessagePayload>,
    },
    /// A new message
    MessagePushed {
        conversation_id: String,
        token: String,
        message: MessagePayload,
    },
    /// Advisory user-facing notice
    MentionNotice {
        conversation_id: String,
        token: String,
        text: String,
    },
    /// Error response
    Error { error: String, message: String },
}

/// Message shape on the wire; timestamps are RFC 3339 strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: String,
    pub author_id: String,
    pub author_display_name: String,
    pub text: String,
    pub created_at: String,
    #[serde(default)]
    pub mentions: Vec<String>,
}

impl MessagePayload {
    /// Validate the payload into a domain message
    pub fn into_message(self) -> SocketResult<Message> {
        if self.id.trim().is_empty() {
            return Err(SocketError::malformed_payload("message id is empty"));
        }
        if self.author_id.trim().is_empty() {
            return Err(SocketError::malformed_payload("message author is empty"));
        }

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)?.to_utc();
        let mentions: BTreeSet<String> = self.mentions.into_iter().collect();

        Ok(Message::new(
            self.id,
            self.author_id,
            self.author_display_name,
            self.text,
            created_at,
        )
        .with_mentions(mentions))
    }

    /// Render a domain message onto the wire
    pub fn from_message(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            author_id: message.author_id.clone(),
            author_display_name: message.author_display_name.clone(),
            text: message.text.clone(),
            created_at: message.created_at.to_rfc3339(),
            mentions: message.mentions.iter().cloned().collect(),
        }
    }
}

impl ServerFrame {
    /// Map a decoded frame to a session event.
    ///
    /// Control frames (`pong`, `subscribed`, `error`) carry no session
    /// state and yield `None`; a backfill with any malformed entry fails as
    /// a whole rather than delivering partial history.
    pub fn into_event(self) -> SocketResult<Option<ConversationEvent>> {
        match self {
            ServerFrame::Backfill { token, messages, .. } => {
                let messages = messages
                    .into_iter()
                    .map(MessagePayload::into_message)
                    .collect::<SocketResult<Vec<_>>>()?;
                Ok(Some(ConversationEvent::BackfillReceived {
                    token: SubscriptionToken::new(token),
                    messages,
                }))
            }
            ServerFrame::MessagePushed { token, message, .. } => {
                Ok(Some(ConversationEvent::MessagePushed {
                    token: SubscriptionToken::new(token),
                    message: message.into_message()?,
                }))
            }
            ServerFrame::MentionNotice { token, text, .. } => {
                Ok(Some(ConversationEvent::MentionNotice {
                    token: SubscriptionToken::new(token),
                    text,
                }))
            }
            ServerFrame::SubscribeFailed { token, reason, .. } => {
                Ok(Some(ConversationEvent::SubscribeFailed {
                    token: SubscriptionToken::new(token),
                    reason,
                }))
            }
            ServerFrame::Pong | ServerFrame::Subscribed { .. } | ServerFrame::Error { .. } => {
                Ok(None)
            }
        }
    }
}

/// Decode an inbound text frame
pub fn decode_server_frame(text: &str) -> SocketResult<ServerFrame> {
    Ok(serde_json::from_str(text)?)
}

/// Encode an outbound frame
pub fn encode_client_frame(frame: &ClientFrame) -> SocketResult<String> {
    Ok(serde_json::to_string(frame)?)
}
