//! In-process loopback transport.
//!
//! Backs the console demo mode and the scenario tests: seeded history per
//! conversation, a seeded roster, and a synchronous event queue the caller
//! drains. Sends echo back through the push path with backend-style minted
//! ids and timestamps, the way a live channel would.

use std::collections::{BTreeSet, HashMap, VecDeque};

use chrono::Utc;
use tracing::debug;

use crate::entities::{Message, Participant};
use crate::transport::{OutboundMessage, SubscriptionToken, Transport, TransportError};
use crate::types::ConversationEvent;

/// A loopback publish/subscribe channel for one session.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    roster: Vec<Participant>,
    history: HashMap<String, Vec<Message>>,
    events: VecDeque<ConversationEvent>,
    active: Option<ActiveSubscription>,
    reject_subscribe: Option<String>,
    defer_subscribe_failure: Option<String>,
    reject_sends: bool,
}

#[derive(Debug)]
struct ActiveSubscription {
    conversation_id: String,
    participant_id: String,
    token: SubscriptionToken,
}

impl LoopbackTransport {
    /// Create a loopback channel over the given roster
    pub fn new(roster: Vec<Participant>) -> Self {
        Self {
            roster,
            ..Self::default()
        }
    }

    /// Seed the stored history for a conversation
    pub fn seed_history(&mut self, conversation_id: impl Into<String>, messages: Vec<Message>) {
        self.history.insert(conversation_id.into(), messages);
    }

    /// Make the next subscribe call fail synchronously
    pub fn reject_next_subscribe(&mut self, reason: impl Into<String>) {
        self.reject_subscribe = Some(reason.into());
    }

    /// Make the next subscribe succeed but report failure via an event
    /// instead of delivering a backfill
    pub fn fail_next_subscription(&mut self, reason: impl Into<String>) {
        self.defer_subscribe_failure = Some(reason.into());
    }

    /// Toggle synchronous rejection of sends
    pub fn set_reject_sends(&mut self, reject: bool) {
        self.reject_sends = reject;
    }

    /// Pop the next queued inbound event, if any
    pub fn poll_event(&mut self) -> Option<ConversationEvent> {
        self.events.pop_front()
    }

    fn display_name(&self, participant_id: &str) -> String {
        self.roster
            .iter()
            .find(|p| p.id == participant_id)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| participant_id.to_string())
    }

    /// Server-side mention resolution over the seeded roster, mirroring the
    /// textual rule the composer uses.
    fn resolve_mentions(&self, text: &str) -> BTreeSet<String> {
        self.roster
            .iter()
            .filter(|p| text.contains(&format!("@{}", p.display_name)))
            .map(|p| p.id.clone())
            .collect()
    }
}

impl Transport for LoopbackTransport {
    fn subscribe(
        &mut self,
        conversation_id: &str,
        participant_id: &str,
    ) -> Result<SubscriptionToken, TransportError> {
        if let Some(reason) = self.reject_subscribe.take() {
            return Err(TransportError::rejected(reason));
        }

        let token = SubscriptionToken::generate();
        self.active = Some(ActiveSubscription {
            conversation_id: conversation_id.to_string(),
            participant_id: participant_id.to_string(),
            token: token.clone(),
        });

        if let Some(reason) = self.defer_subscribe_failure.take() {
            self.events.push_back(ConversationEvent::SubscribeFailed {
                token: token.clone(),
                reason,
            });
            return Ok(token);
        }

        let messages = self
            .history
            .get(conversation_id)
            .cloned()
            .unwrap_or_default();
        debug!(
            conversation = conversation_id,
            count = messages.len(),
            "queueing backfill"
        );
        self.events.push_back(ConversationEvent::BackfillReceived {
            token: token.clone(),
            messages,
        });

        Ok(token)
    }

    fn send_message(&mut self, outbound: &OutboundMessage) -> Result<(), TransportError> {
        if self.reject_sends {
            return Err(TransportError::rejected("sends disabled"));
        }

        let Some(active) = &self.active else {
            return Err(TransportError::Closed);
        };
        if active.conversation_id != outbound.conversation_id {
            return Err(TransportError::rejected("not subscribed to conversation"));
        }

        let message = Message::new(
            cuid2::create_id(),
            outbound.author_id.clone(),
            self.display_name(&outbound.author_id),
            outbound.text.clone(),
            Utc::now(),
        )
        .with_mentions(self.resolve_mentions(&outbound.text));

        let token = active.token.clone();
        let notify_subscriber = message.mentions_participant(&active.participant_id)
            && active.participant_id != outbound.author_id;
        let notice = format!(
            "{} mentioned you in {}",
            message.author_display_name, active.conversation_id
        );

        self.history
            .entry(outbound.conversation_id.clone())
            .or_default()
            .push(message.clone());
        self.events.push_back(ConversationEvent::MessagePushed {
            token: token.clone(),
            message,
        });

        if notify_subscriber {
            self.events
                .push_back(ConversationEvent::MentionNotice { token, text: notice });
        }

        Ok(())
    }

    fn unsubscribe(&mut self, token: &SubscriptionToken) -> Result<(), TransportError> {
        if let Some(active) = &self.active {
            if &active.token == token {
                self.active = None;
            }
        }
        // Already-queued events stay queued; the session discards them by
        // token on arrival.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn roster() -> Vec<Participant> {
        vec![
            Participant::new("u-1", "Sarah Johnson"),
            Participant::new("u-2", "Mike Chen"),
        ]
    }

    #[test]
    fn test_subscribe_queues_seeded_backfill() {
        let mut transport = LoopbackTransport::new(roster());
        transport.seed_history(
            "project-1",
            vec![Message::new(
                "m-1",
                "u-2",
                "Mike Chen",
                "hello",
                DateTime::from_timestamp(1, 0).unwrap(),
            )],
        );

        let token = transport.subscribe("project-1", "u-1").unwrap();

        match transport.poll_event() {
            Some(ConversationEvent::BackfillReceived {
                token: event_token,
                messages,
            }) => {
                assert_eq!(event_token, token);
                assert_eq!(messages.len(), 1);
            }
            other => panic!("expected backfill, got {other:?}"),
        }
    }

    #[test]
    fn test_send_echoes_as_push_with_resolved_mentions() {
        let mut transport = LoopbackTransport::new(roster());
        let token = transport.subscribe("project-1", "u-1").unwrap();
        let _ = transport.poll_event();

        transport
            .send_message(&OutboundMessage {
                conversation_id: "project-1".to_string(),
                text: "@Sarah Johnson take a look".to_string(),
                author_id: "u-2".to_string(),
            })
            .unwrap();

        match transport.poll_event() {
            Some(ConversationEvent::MessagePushed {
                token: event_token,
                message,
            }) => {
                assert_eq!(event_token, token);
                assert_eq!(message.author_display_name, "Mike Chen");
                assert!(message.mentions_participant("u-1"));
                assert!(!message.id.is_empty());
            }
            other => panic!("expected push, got {other:?}"),
        }

        // The subscriber was mentioned by someone else: a notice follows.
        assert!(matches!(
            transport.poll_event(),
            Some(ConversationEvent::MentionNotice { .. })
        ));
    }

    #[test]
    fn test_no_notice_for_self_mention() {
        let mut transport = LoopbackTransport::new(roster());
        transport.subscribe("project-1", "u-1").unwrap();
        let _ = transport.poll_event();

        transport
            .send_message(&OutboundMessage {
                conversation_id: "project-1".to_string(),
                text: "@Sarah Johnson reminding myself".to_string(),
                author_id: "u-1".to_string(),
            })
            .unwrap();

        assert!(matches!(
            transport.poll_event(),
            Some(ConversationEvent::MessagePushed { .. })
        ));
        assert!(transport.poll_event().is_none());
    }

    #[test]
    fn test_send_without_subscription_is_closed() {
        let mut transport = LoopbackTransport::new(roster());

        let error = transport
            .send_message(&OutboundMessage {
                conversation_id: "project-1".to_string(),
                text: "hello".to_string(),
                author_id: "u-1".to_string(),
            })
            .unwrap_err();

        assert_eq!(error, TransportError::Closed);
    }

    #[test]
    fn test_rejected_subscribe() {
        let mut transport = LoopbackTransport::new(roster());
        transport.reject_next_subscribe("not a member");

        assert!(transport.subscribe("project-1", "u-1").is_err());
        // The rejection is one-shot.
        assert!(transport.subscribe("project-1", "u-1").is_ok());
    }

    #[test]
    fn test_deferred_subscription_failure_arrives_as_event() {
        let mut transport = LoopbackTransport::new(roster());
        transport.fail_next_subscription("backfill timeout");

        let token = transport.subscribe("project-1", "u-1").unwrap();

        match transport.poll_event() {
            Some(ConversationEvent::SubscribeFailed {
                token: event_token, ..
            }) => assert_eq!(event_token, token),
            other => panic!("expected failure event, got {other:?}"),
        }
    }
}
