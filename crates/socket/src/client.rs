//! WebSocket client: the connection task plus the [`Transport`] handle.
//!
//! The connection is owned by a background task that pumps two directions:
//! command frames from the handle toward the socket, and decoded inbound
//! frames toward the session's event channel. Malformed inbound frames are
//! logged and dropped; they never reach the session. Reconnection policy is
//! deliberately the caller's, matching the no-automatic-retry subscription
//! contract.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use teamline_chat::{
    ConversationEvent, OutboundMessage, SubscriptionToken, Transport, TransportError,
};

use crate::auth::CredentialProvider;
use crate::error::{SocketError, SocketResult};
use crate::wire::{self, ClientFrame, ServerFrame};

/// Transport handle over a live connection.
///
/// Calls enqueue frames on the connection task and never block; once the
/// task is gone every call fails with [`TransportError::Closed`].
#[derive(Debug, Clone)]
pub struct SocketHandle {
    commands: UnboundedSender<ClientFrame>,
}

impl SocketHandle {
    /// Send a heartbeat frame
    pub fn ping(&self) -> Result<(), TransportError> {
        self.commands
            .send(ClientFrame::Ping)
            .map_err(|_| TransportError::Closed)
    }
}

impl Transport for SocketHandle {
    fn subscribe(
        &mut self,
        conversation_id: &str,
        participant_id: &str,
    ) -> Result<SubscriptionToken, TransportError> {
        let token = SubscriptionToken::generate();
        self.commands
            .send(ClientFrame::Subscribe {
                conversation_id: conversation_id.to_string(),
                participant_id: participant_id.to_string(),
                token: token.as_str().to_string(),
            })
            .map_err(|_| TransportError::Closed)?;
        Ok(token)
    }

    fn send_message(&mut self, outbound: &OutboundMessage) -> Result<(), TransportError> {
        self.commands
            .send(ClientFrame::SendMessage {
                conversation_id: outbound.conversation_id.clone(),
                text: outbound.text.clone(),
                author_id: outbound.author_id.clone(),
            })
            .map_err(|_| TransportError::Closed)
    }

    fn unsubscribe(&mut self, token: &SubscriptionToken) -> Result<(), TransportError> {
        self.commands
            .send(ClientFrame::Unsubscribe {
                token: token.as_str().to_string(),
            })
            .map_err(|_| TransportError::Closed)
    }
}

/// Connect to the messaging backend.
///
/// The access token, when present, rides the upgrade request as a query
/// parameter. Returns the transport handle plus the receiver the caller
/// feeds into `ChatSession::handle_event`.
pub async fn connect(
    url: &str,
    credentials: &dyn CredentialProvider,
    connect_timeout: Duration,
) -> SocketResult<(SocketHandle, UnboundedReceiver<ConversationEvent>)> {
    let request_url = match credentials.access_token() {
        Some(token) => format!("{url}?token={token}"),
        None => url.to_string(),
    };

    let (stream, _response) = timeout(connect_timeout, connect_async(request_url.as_str()))
        .await
        .map_err(|_| SocketError::handshake("connect timed out"))?
        .map_err(|error| SocketError::handshake(error.to_string()))?;

    debug!(url, "socket connected");

    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_connection(stream, commands_rx, events_tx));

    Ok((
        SocketHandle {
            commands: commands_tx,
        },
        events_rx,
    ))
}

async fn run_connection(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut commands: UnboundedReceiver<ClientFrame>,
    events: UnboundedSender<ConversationEvent>,
) {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(frame) => {
                    let text = match wire::encode_client_frame(&frame) {
                        Ok(text) => text,
                        Err(error) => {
                            warn!(%error, "dropping unencodable frame");
                            continue;
                        }
                    };
                    if sink.send(WsMessage::Text(text)).await.is_err() {
                        break;
                    }
                }
                None => {
                    // Every handle dropped; close the socket cleanly.
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }
            },
            inbound = source.next() => match inbound {
                Some(Ok(WsMessage::Text(text))) => {
                    match wire::decode_server_frame(&text).and_then(ServerFrame::into_event) {
                        Ok(Some(event)) => {
                            if events.send(event).is_err() {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(error) => warn!(%error, "discarding malformed frame"),
                    }
                }
                Some(Ok(WsMessage::Close(_))) => break,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    warn!(%error, "socket read error");
                    break;
                }
                None => break,
            },
        }
    }

    debug!("socket connection task finished");
}
