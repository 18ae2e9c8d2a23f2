//! # Teamline Chat Crate
//!
//! This crate provides the embeddable chat core for Teamline clients: the
//! per-conversation message log, the mention-aware composer, and the session
//! state machine that ties them to a publish/subscribe transport.
//!
//! ## Architecture
//!
//! - **Entities**: Domain models (Participant, Message, DraftMessage)
//! - **MentionIndex**: Prefix search over the conversation roster
//! - **MessageComposer**: Draft buffer with @-mention trigger detection
//! - **MessageStream**: Ordered, deduplicated message log
//! - **ChatSession**: Subscription lifecycle and event application
//! - **Transport**: The seam a concrete channel implements
//!
//! ## Usage
//!
//! ```rust
//! use teamline_chat::{ChatSession, LoopbackTransport, Participant};
//!
//! let roster = vec![Participant::new("u-1", "Sarah Johnson")];
//! let transport = LoopbackTransport::new(roster.clone());
//! let mut session = ChatSession::new(transport, "u-1");
//! session.open("project-1", roster).unwrap();
//! ```

pub mod composer;
pub mod entities;
pub mod loopback;
pub mod mentions;
pub mod session;
pub mod stream;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use composer::{MessageComposer, DEFAULT_MAX_MESSAGE_LENGTH};
pub use entities::{DraftMessage, Message, Participant};
pub use loopback::LoopbackTransport;
pub use mentions::MentionIndex;
pub use session::{ChatSession, ConversationHandle, SessionPhase};
pub use stream::MessageStream;
pub use transport::{OutboundMessage, SubscriptionToken, Transport, TransportError};
pub use types::{ChatError, ChatResult, ConversationEvent, EventOutcome};
