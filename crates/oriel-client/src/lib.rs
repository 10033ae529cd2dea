#![warn(missing_docs)]

//! # oriel-client
//!
//! Session client for the Oriel workbench backend.
//!
//! Provides [`SessionClient`] for a single persistent session connection,
//! and [`ClientPool`] — a process-local connection pool keyed by a
//! caller-supplied identity with reference counting, so several UI
//! surfaces in one process share one session instead of racing to open
//! duplicates.

pub mod pool;

pub use pool::{ClientPool, PoolHandle};

use anyhow::{Context, Result};
use oriel_proto::{read_frame, write_frame, Request, Response};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// One persistent session connection.
///
/// Requests are serialized internally: the protocol carries no correlation
/// IDs, so a connection must never interleave two request/response pairs.
#[derive(Debug)]
pub struct SessionClient {
    stream: Mutex<TcpStream>,
    peer: String,
}

impl SessionClient {
    /// Open a session to the given `host:port` address.
    pub async fn connect(addr: &str) -> Result<Self> {
        tracing::info!(%addr, "opening session");
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("failed to connect to oriel backend at {addr}"))?;
        Ok(Self {
            stream: Mutex::new(stream),
            peer: addr.to_string(),
        })
    }

    /// The address this session is connected to.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Send one request and await its response envelope.
    pub async fn request(&self, request: &Request) -> Result<Response> {
        let mut stream = self.stream.lock().await;

        write_frame(&mut *stream, request)
            .await
            .with_context(|| format!("failed to send request to {}", self.peer))?;

        let payload = read_frame(&mut *stream)
            .await
            .with_context(|| format!("failed to read response from {}", self.peer))?
            .with_context(|| format!("session to {} closed by server", self.peer))?;

        let response = serde_json::from_slice(&payload)
            .with_context(|| format!("malformed response from {}", self.peer))?;
        Ok(response)
    }
}
