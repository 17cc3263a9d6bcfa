//! WebSocket transport
//!
//! This file implements the WebSocket server that feeds the load-balance
//! concept. Responsibilities:
//! - Accept TCP/WebSocket connections
//! - Create a `Connection` for each socket through `on_open`
//! - Run one writer task per socket, draining the connection's channel, so
//!   frames from local and relayed sends never interleave
//! - Translate incoming frames, closes and errors into concept callbacks
//! - Release the socket after a server-side close, even if the peer is silent

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::concept::LoadBalanceConcept;
use crate::connection::{ChannelTransport, ConnectionType, Metadata};
use crate::message::Frame;

pub const REMOTE_ADDR_KEY: &str = "remote_addr";

/// How long a server-initiated close waits for the peer's close reply.
pub const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn start_websocket_server(
    addr: String,
    concept: Arc<LoadBalanceConcept>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, concept).await
}

/// Accepts connections on `listener` until it fails.
pub async fn serve(listener: TcpListener, concept: Arc<LoadBalanceConcept>) -> std::io::Result<()> {
    info!(
        "WebSocket server listening on ws://{} as instance {}",
        listener.local_addr()?,
        concept.identity().instance_id()
    );

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                spawn(handle_connection(stream, peer, concept.clone()));
            }
            Err(e) => warn!("Failed to accept connection: {e}"),
        }
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, concept: Arc<LoadBalanceConcept>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake error: {e}");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    let mut metadata = Metadata::new();
    metadata.insert(REMOTE_ADDR_KEY.to_string(), peer.to_string());
    let connection = concept.on_open(
        Box::new(ChannelTransport::new(tx)),
        ConnectionType::Client,
        metadata,
    );
    let connection_id = connection.id().to_string();
    drop(connection);

    // Resolves once the writer has stopped, normally right after a close frame
    let (writer_done_tx, mut writer_done) = oneshot::channel::<()>();
    {
        let concept = concept.clone();
        let connection_id = connection_id.clone();

        spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = msg.is_close();
                if let Err(e) = ws_sender.send(msg).await {
                    concept.on_error(&connection_id, e.into());
                    break;
                }
                if closing {
                    break;
                }
            }
            drop(writer_done_tx);
            debug!("Send loop closed for {connection_id}");
        });
    }

    let server_closed = tokio::select! {
        _ = read_frames(&mut ws_receiver, &concept, &connection_id) => false,
        _ = &mut writer_done => true,
    };
    if server_closed {
        // Wait briefly for the peer's close reply, then drop the socket anyway
        let handshake = read_frames(&mut ws_receiver, &concept, &connection_id);
        if timeout(CLOSE_HANDSHAKE_TIMEOUT, handshake).await.is_err() {
            debug!("Peer {peer} never answered close for {connection_id}");
        }
    }

    concept.on_close(&connection_id, "stream ended");
}

/// Feeds incoming frames to the concept until the peer closes or fails.
async fn read_frames(
    receiver: &mut SplitStream<WebSocketStream<TcpStream>>,
    concept: &LoadBalanceConcept,
    connection_id: &str,
) {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(WsMessage::Close(frame)) => {
                let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                concept.on_close(connection_id, &reason);
                return;
            }
            Ok(msg) => {
                if let Some(frame) = to_frame(msg) {
                    concept.on_message(connection_id, frame);
                }
            }
            Err(e) => {
                concept.on_error(connection_id, e.into());
                return;
            }
        }
    }
}

/// Converts a received websocket message into a transport-neutral frame.
pub fn to_frame(msg: WsMessage) -> Option<Frame> {
    match msg {
        WsMessage::Text(text) => Some(Frame::Text(text.to_string())),
        WsMessage::Binary(data) => Some(Frame::Binary(data.to_vec())),
        WsMessage::Ping(data) => Some(Frame::Ping(data.to_vec())),
        WsMessage::Pong(data) => Some(Frame::Pong(data.to_vec())),
        WsMessage::Close(_) | WsMessage::Frame(_) => None,
    }
}
