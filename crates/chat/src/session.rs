//! Chat session: the subscription lifecycle for one conversation.
//!
//! The session composes the mention index, the composer, and the message
//! stream over an injected [`Transport`] and runs the
//! `Idle -> Subscribing -> Active -> Idle` state machine. All state
//! mutations are expected to run on one event-processing context; event
//! handlers run to completion and never call back into the transport.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::composer::MessageComposer;
use crate::entities::{DraftMessage, Message, Participant};
use crate::mentions::MentionIndex;
use crate::stream::MessageStream;
use crate::transport::{OutboundMessage, SubscriptionToken, Transport};
use crate::types::{ChatError, ChatResult, ConversationEvent, EventOutcome};
use crate::utils::Validator;

/// Identifies the active subscription: the conversation plus the token the
/// transport minted for it. One active handle per session; replacing the
/// conversation tears down the old handle before establishing a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHandle {
    /// Conversation this handle subscribes to
    pub conversation_id: String,
    /// Transport subscription token scoping inbound events
    pub token: SubscriptionToken,
}

impl ConversationHandle {
    /// Create a new handle
    pub fn new(conversation_id: impl Into<String>, token: SubscriptionToken) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            token,
        }
    }
}

/// Externally observable session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No subscription
    Idle,
    /// Subscribe issued, waiting for the backfill
    Subscribing,
    /// Backfill loaded, live pushes applied as they arrive
    Active,
}

enum SessionState {
    Idle,
    Subscribing {
        handle: ConversationHandle,
        pending: Vec<Message>,
    },
    Active {
        handle: ConversationHandle,
    },
}

impl SessionState {
    fn handle(&self) -> Option<&ConversationHandle> {
        match self {
            SessionState::Idle => None,
            SessionState::Subscribing { handle, .. } | SessionState::Active { handle } => {
                Some(handle)
            }
        }
    }
}

/// One participant's view of one conversation at a time.
pub struct ChatSession<T: Transport> {
    transport: T,
    participant_id: String,
    index: MentionIndex,
    composer: MessageComposer,
    stream: MessageStream,
    state: SessionState,
}

impl<T: Transport> ChatSession<T> {
    /// Create an idle session for the given local participant
    pub fn new(transport: T, participant_id: impl Into<String>) -> Self {
        Self {
            transport,
            participant_id: participant_id.into(),
            index: MentionIndex::new(),
            composer: MessageComposer::new(),
            stream: MessageStream::new(),
            state: SessionState::Idle,
        }
    }

    /// Replace the composer's message length cap
    pub fn set_message_limit(&mut self, max_length: usize) {
        self.composer = MessageComposer::with_max_length(max_length);
    }

    /// Get the current phase
    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Subscribing { .. } => SessionPhase::Subscribing,
            SessionState::Active { .. } => SessionPhase::Active,
        }
    }

    /// Get the active conversation id, if any
    pub fn conversation_id(&self) -> Option<&str> {
        self.state
            .handle()
            .map(|handle| handle.conversation_id.as_str())
    }

    /// Get the local participant id
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Ordered snapshot of the conversation log
    pub fn messages(&self) -> &[Message] {
        self.stream.current_view()
    }

    /// Current roster, in directory order
    pub fn participants(&self) -> &[Participant] {
        self.index.participants()
    }

    /// Read access to the composer
    pub fn composer(&self) -> &MessageComposer {
        &self.composer
    }

    /// Mutable access to the transport, for implementations that expose a
    /// pollable event queue
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Open a conversation.
    ///
    /// Any live subscription is closed first, so no event from the old
    /// conversation can be applied once this call begins. The supplied
    /// directory snapshot replaces the mention roster, then a subscribe is
    /// issued and the session waits in `Subscribing` for the backfill.
    ///
    /// A transport rejection surfaces as [`ChatError::SubscriptionFailed`]
    /// and leaves the session idle; retry policy is the caller's.
    pub fn open(
        &mut self,
        conversation_id: &str,
        participants: Vec<Participant>,
    ) -> ChatResult<()> {
        Validator::conversation_id(conversation_id)?;

        self.close();
        self.index.refresh(participants);

        let token = self
            .transport
            .subscribe(conversation_id, &self.participant_id)
            .map_err(|error| ChatError::subscription_failed(error.to_string()))?;

        debug!(conversation = conversation_id, %token, "subscribing");
        self.state = SessionState::Subscribing {
            handle: ConversationHandle::new(conversation_id, token),
            pending: Vec::new(),
        };
        Ok(())
    }

    /// Tear down the current subscription, discarding the stream contents.
    ///
    /// Safe to call in any state, including mid-`Subscribing`; late events
    /// for the old token are discarded when they arrive.
    pub fn close(&mut self) {
        if let Some(handle) = self.state.handle() {
            debug!(conversation = %handle.conversation_id, "closing subscription");
            if let Err(error) = self.transport.unsubscribe(&handle.token) {
                warn!(%error, conversation = %handle.conversation_id, "unsubscribe failed");
            }
        }

        self.stream.clear();
        self.state = SessionState::Idle;
    }

    /// Apply one inbound transport event.
    ///
    /// Events scoped to anything but the active handle are dropped silently:
    /// stale deliveries after a close or a conversation switch are expected,
    /// not exceptional. Handlers never call back into the transport.
    pub fn handle_event(&mut self, event: ConversationEvent) -> ChatResult<EventOutcome> {
        let stale = match self.state.handle() {
            Some(handle) => event.token() != &handle.token,
            None => true,
        };
        if stale {
            debug!(event = event.event_type_name(), "discarding stale event");
            return Ok(EventOutcome::Discarded);
        }

        match event {
            ConversationEvent::BackfillReceived { messages, .. } => {
                self.stream.load_backfill(messages);

                match std::mem::replace(&mut self.state, SessionState::Idle) {
                    SessionState::Subscribing { handle, pending } => {
                        let replayed = pending.len();
                        for message in pending {
                            self.stream.append(message);
                        }
                        debug!(
                            conversation = %handle.conversation_id,
                            replayed,
                            "backfill loaded"
                        );
                        self.state = SessionState::Active { handle };
                        Ok(EventOutcome::BackfillLoaded { replayed })
                    }
                    // A defensive re-send while already active: the transport
                    // is authoritative for history and the reload converges.
                    state => {
                        self.state = state;
                        Ok(EventOutcome::Applied)
                    }
                }
            }

            ConversationEvent::MessagePushed { message, .. } => match &mut self.state {
                SessionState::Subscribing { pending, .. } => {
                    pending.push(message);
                    Ok(EventOutcome::Queued)
                }
                SessionState::Active { .. } => {
                    if self.stream.append(message) {
                        Ok(EventOutcome::Applied)
                    } else {
                        Ok(EventOutcome::Duplicate)
                    }
                }
                SessionState::Idle => Ok(EventOutcome::Discarded),
            },

            ConversationEvent::MentionNotice { text, .. } => Ok(EventOutcome::Notice(text)),

            ConversationEvent::SubscribeFailed { reason, .. } => match self.state {
                SessionState::Subscribing { .. } => {
                    self.stream.clear();
                    self.state = SessionState::Idle;
                    Err(ChatError::subscription_failed(reason))
                }
                _ => {
                    warn!(%reason, "subscribe failure for an established handle");
                    Ok(EventOutcome::Discarded)
                }
            },
        }
    }

    /// Route a text change into the composer
    pub fn on_text_changed(&mut self, text: &str) {
        self.composer.on_text_changed(text);
    }

    /// Autocomplete suggestions for the active mention trigger.
    ///
    /// Empty when no trigger is active; otherwise the roster subsequence
    /// matching the trigger prefix.
    pub fn mention_suggestions(&self) -> Vec<&Participant> {
        match self.composer.active_prefix() {
            Some(prefix) => self.index.search(Some(prefix)).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Accept a suggestion into the composer
    pub fn select_mention(&mut self, participant: &Participant) {
        self.composer.on_mention_selected(participant);
    }

    /// Finalize the draft and transmit it.
    ///
    /// The composer buffer is cleared only after the transport accepts the
    /// send; a rejection surfaces [`ChatError::SendFailed`] with the draft
    /// intact so the caller can resubmit. The authoritative message arrives
    /// later through the push path; no optimistic local append. Returns the
    /// finalized draft.
    pub fn submit(&mut self) -> ChatResult<DraftMessage> {
        let conversation_id = match &self.state {
            SessionState::Active { handle } => handle.conversation_id.clone(),
            _ => return Err(ChatError::NotActive),
        };

        let draft = self.composer.finalize(&self.index)?;
        let outbound = OutboundMessage {
            conversation_id,
            text: draft.text.clone(),
            author_id: self.participant_id.clone(),
        };

        self.transport
            .send_message(&outbound)
            .map_err(|error| ChatError::send_failed(error.to_string()))?;

        self.composer.clear();
        Ok(draft)
    }
}
