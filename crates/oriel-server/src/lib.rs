#![warn(missing_docs)]

//! # oriel-server
//!
//! Session dispatcher for the Oriel workbench backend.
//!
//! Accepts persistent client connections, parses each inbound message
//! independently, routes by declared message type to the file, shell, or
//! build service, and sends back exactly one response envelope per request.
//! Failures are isolated per message: a malformed request or a handler
//! error produces an error envelope on that session without closing it —
//! only transport errors or an explicit close terminate a session.
//!
//! The dispatcher holds no cross-message state. Sessions share the service
//! set behind an `Arc` and execute concurrently with each other; messages
//! on one session are handled sequentially because the wire protocol
//! carries no correlation IDs.

pub mod dispatch;

pub use dispatch::{dispatch, Services};

use std::sync::Arc;

use oriel_proto::{read_frame_with_limit, write_frame, FrameError, Response};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};

/// The session server: an accept loop spawning one task per connection.
pub struct SessionServer {
    services: Arc<Services>,
    max_frame_size: usize,
}

impl SessionServer {
    /// Create a server over the given services.
    pub fn new(services: Services, max_frame_size: usize) -> Self {
        Self {
            services: Arc::new(services),
            max_frame_size,
        }
    }

    /// Serve sessions from the listener until it fails.
    ///
    /// Runs forever under normal operation; callers decide shutdown policy
    /// (e.g. racing this future against a signal).
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            tracing::info!(%peer, "session opened");

            let services = self.services.clone();
            let max_frame_size = self.max_frame_size;
            tokio::spawn(async move {
                handle_session(stream, services, max_frame_size).await;
                tracing::info!(%peer, "session closed");
            });
        }
    }
}

/// Drive one session: read a frame, handle it, answer with one frame.
async fn handle_session(stream: TcpStream, services: Arc<Services>, max_frame_size: usize) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        let response = match read_frame_with_limit(&mut reader, max_frame_size).await {
            Ok(Some(payload)) => handle_payload(&services, &payload).await,
            Ok(None) => break, // clean close
            Err(FrameError::TooLarge { len, max }) => {
                // Payload already drained — the session survives.
                Response::Error {
                    message: format!("protocol error: message too large: {len} bytes (limit: {max} bytes)"),
                }
            }
            Err(FrameError::Io(e)) => {
                tracing::debug!(error = %e, "session transport error");
                break;
            }
        };

        if let Err(e) = write_frame(&mut write_half, &response).await {
            tracing::debug!(error = %e, "failed to write response, closing session");
            break;
        }
    }
}

/// Parse one message payload and dispatch it.
///
/// The envelope is validated here, at the dispatcher boundary, before any
/// handler sees it — a field that does not belong to the declared
/// type/action never reaches a service.
async fn handle_payload(services: &Services, payload: &[u8]) -> Response {
    let value: serde_json::Value = match serde_json::from_slice(payload) {
        Ok(value) => value,
        Err(e) => {
            return Response::Error {
                message: format!("protocol error: invalid JSON: {e}"),
            };
        }
    };

    let request = match serde_json::from_value::<oriel_proto::Request>(value.clone()) {
        Ok(request) => request,
        Err(e) => {
            let message = match value.get("type").and_then(|t| t.as_str()) {
                None => "protocol error: missing message type".to_string(),
                Some(tag @ ("file" | "command" | "build")) => {
                    format!("protocol error: invalid {tag} message: {e}")
                }
                Some(tag) => format!("protocol error: unknown message type '{tag}'"),
            };
            return Response::Error { message };
        }
    };

    dispatch(services, request).await
}
