//! # Teamline Socket Crate
//!
//! WebSocket transport adapter for the chat core: a tagged-JSON wire
//! protocol, boundary validation of inbound payloads into typed entities,
//! and a connection task exposing the [`teamline_chat::Transport`] seam.

pub mod auth;
pub mod client;
pub mod error;
pub mod wire;

pub use auth::{CredentialProvider, StaticToken};
pub use client::{connect, SocketHandle};
pub use error::{SocketError, SocketResult};
pub use wire::{ClientFrame, MessagePayload, ServerFrame};
