// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Frame transport.
//!
//! A transport moves raw text frames. Parsing and dispatch live in the
//! session loop, so a malformed frame never tears down the connection.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("could not open connection: {0}")]
    Dial(String),

    #[error("connection closed")]
    Closed,

    #[error("write failed: {0}")]
    Write(String),

    #[error("read failed: {0}")]
    Read(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport`] methods.
pub type FrameFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// A bidirectional text-frame connection.
///
/// One value serves a single connection lifetime at a time; the session
/// task owns it exclusively, so methods take `&mut self`.
pub trait Transport: Send + Sync {
    /// Opens a connection to `url`.
    fn connect(&mut self, url: &str) -> FrameFuture<'_, ()>;

    /// Closes the connection. Closing an unopened transport succeeds.
    fn disconnect(&mut self) -> FrameFuture<'_, ()>;

    fn send(&mut self, frame: String) -> FrameFuture<'_, ()>;

    /// Next inbound text frame, or `None` once the peer has closed.
    ///
    /// Must be cancel safe: the session loop drops a pending `recv`
    /// whenever a timer fires.
    fn recv(&mut self) -> FrameFuture<'_, Option<String>>;

    fn is_connected(&self) -> bool;
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// [`Transport`] over tokio-tungstenite.
#[derive(Default)]
pub struct WebSocketTransport {
    writer: Option<SplitSink<Socket, Message>>,
    reader: Option<SplitStream<Socket>>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn drop_socket(&mut self) {
        self.writer = None;
        self.reader = None;
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, url: &str) -> FrameFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            let (socket, response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Dial(e.to_string()))?;
            debug!(status = %response.status(), "websocket handshake complete");

            let (writer, reader) = socket.split();
            self.writer = Some(writer);
            self.reader = Some(reader);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> FrameFuture<'_, ()> {
        Box::pin(async move {
            self.reader = None;
            if let Some(mut writer) = self.writer.take() {
                // Peer may already be gone.
                let _ = writer.close().await;
            }
            Ok(())
        })
    }

    fn send(&mut self, frame: String) -> FrameFuture<'_, ()> {
        Box::pin(async move {
            let writer = self.writer.as_mut().ok_or(TransportError::Closed)?;
            // `send` flushes, so a dead socket fails here and not on the next frame.
            let result = writer.send(Message::Text(frame.into())).await;
            if let Err(e) = result {
                self.drop_socket();
                return Err(TransportError::Write(e.to_string()));
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> FrameFuture<'_, Option<String>> {
        Box::pin(async move {
            let reader = self.reader.as_mut().ok_or(TransportError::Closed)?;
            loop {
                let message = match reader.next().await {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        self.drop_socket();
                        return Err(TransportError::Read(e.to_string()));
                    }
                    None => {
                        self.drop_socket();
                        return Ok(None);
                    }
                };
                match message {
                    Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
                    Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => debug!(len = bytes.len(), "skipping non-utf8 binary frame"),
                    },
                    Message::Close(frame) => {
                        debug!(?frame, "server closed the connection");
                        self.drop_socket();
                        return Ok(None);
                    }
                    // Protocol ping/pong is answered by tungstenite.
                    Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.writer.is_some()
    }
}
