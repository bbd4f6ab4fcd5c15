// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Mock transport and tests for the transport module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::transport::{FrameFuture, Transport, TransportError};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Scripted server shared by every transport it hands out.
///
/// Each successful dial opens a fresh in-memory connection; the test pushes
/// frames into (or closes) whichever connection is current.
#[derive(Clone, Default)]
pub struct MockServer {
    state: Arc<Mutex<ServerState>>,
}

#[derive(Default)]
struct ServerState {
    /// URLs dialed, in order, including failed dials.
    dials: Vec<String>,
    /// Upcoming dials that should fail.
    failing_dials: u32,
    /// Every dial fails while set.
    refuse_all: bool,
    /// Sends fail while set.
    fail_sends: bool,
    /// Frames sent by the client across all connections.
    sent: Vec<String>,
    /// Feed for the current connection. Dropping it closes the connection.
    peer: Option<mpsc::UnboundedSender<String>>,
    /// Number of client-initiated disconnects.
    disconnects: u32,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a transport bound to this server.
    pub fn transport(&self) -> MockTransport {
        MockTransport {
            server: Arc::clone(&self.state),
            rx: None,
        }
    }

    /// Pushes a raw text frame to the current connection.
    pub fn push(&self, frame: &str) {
        if let Some(peer) = &self.state.lock().unwrap().peer {
            let _ = peer.send(frame.to_string());
        }
    }

    /// Pushes a JSON frame to the current connection.
    pub fn push_json(&self, frame: serde_json::Value) {
        self.push(&frame.to_string());
    }

    /// Closes the current connection from the server side.
    pub fn close(&self) {
        self.state.lock().unwrap().peer = None;
    }

    /// Makes the next `n` dials fail.
    pub fn fail_next_dials(&self, n: u32) {
        self.state.lock().unwrap().failing_dials = n;
    }

    /// Makes every dial fail until cleared.
    pub fn refuse_all(&self, refuse: bool) {
        self.state.lock().unwrap().refuse_all = refuse;
    }

    /// Makes sends fail until cleared.
    pub fn fail_sends(&self, fail: bool) {
        self.state.lock().unwrap().fail_sends = fail;
    }

    pub fn dials(&self) -> Vec<String> {
        self.state.lock().unwrap().dials.clone()
    }

    pub fn disconnects(&self) -> u32 {
        self.state.lock().unwrap().disconnects
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }

    /// `type` of every frame sent by the client.
    pub fn sent_kinds(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|f| serde_json::from_str::<serde_json::Value>(f).ok())
            .filter_map(|v| v["type"].as_str().map(str::to_string))
            .collect()
    }

    pub fn ping_count(&self) -> usize {
        self.sent_kinds().iter().filter(|k| *k == "ping").count()
    }
}

/// One client connection to a [`MockServer`].
pub struct MockTransport {
    server: Arc<Mutex<ServerState>>,
    rx: Option<mpsc::UnboundedReceiver<String>>,
}

impl Transport for MockTransport {
    fn connect(&mut self, url: &str) -> FrameFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            let mut state = self.server.lock().unwrap();
            state.dials.push(url);
            if state.refuse_all {
                return Err(TransportError::Dial("connection refused".into()));
            }
            if state.failing_dials > 0 {
                state.failing_dials -= 1;
                return Err(TransportError::Dial("mock failure".into()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            state.peer = Some(tx);
            drop(state);
            self.rx = Some(rx);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> FrameFuture<'_, ()> {
        Box::pin(async move {
            if self.rx.take().is_some() {
                self.server.lock().unwrap().disconnects += 1;
            }
            Ok(())
        })
    }

    fn send(&mut self, frame: String) -> FrameFuture<'_, ()> {
        Box::pin(async move {
            if self.rx.is_none() {
                return Err(TransportError::Closed);
            }
            let mut state = self.server.lock().unwrap();
            if state.fail_sends {
                return Err(TransportError::Write("mock send failure".into()));
            }
            state.sent.push(frame);
            Ok(())
        })
    }

    fn recv(&mut self) -> FrameFuture<'_, Option<String>> {
        Box::pin(async move {
            let rx = self.rx.as_mut().ok_or(TransportError::Closed)?;
            match rx.recv().await {
                Some(frame) => Ok(Some(frame)),
                None => {
                    self.rx = None;
                    Ok(None)
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.rx.is_some()
    }
}

#[tokio::test]
async fn test_mock_transport_connect() {
    let server = MockServer::new();
    let mut transport = server.transport();
    assert!(!transport.is_connected());

    transport.connect("ws://localhost:1234/logs").await.unwrap();
    assert!(transport.is_connected());
    assert_eq!(server.dials(), vec!["ws://localhost:1234/logs".to_string()]);

    transport.disconnect().await.unwrap();
    assert!(!transport.is_connected());
    assert_eq!(server.disconnects(), 1);
}

#[tokio::test]
async fn test_mock_transport_send_recv() {
    let server = MockServer::new();
    let mut transport = server.transport();
    transport.connect("ws://localhost:1234").await.unwrap();

    transport.send(r#"{"type":"ping"}"#.to_string()).await.unwrap();
    assert_eq!(server.sent_kinds(), vec!["ping".to_string()]);

    server.push(r#"{"type":"pong"}"#);
    let received = transport.recv().await.unwrap();
    assert_eq!(received.as_deref(), Some(r#"{"type":"pong"}"#));

    server.close();
    assert!(transport.recv().await.unwrap().is_none());
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn test_mock_transport_connect_fail() {
    let server = MockServer::new();
    server.fail_next_dials(1);
    let mut transport = server.transport();

    let result = transport.connect("ws://localhost:1234").await;
    assert!(matches!(result, Err(TransportError::Dial(_))));
    assert!(!transport.is_connected());

    transport.connect("ws://localhost:1234").await.unwrap();
    assert!(transport.is_connected());
}

#[tokio::test]
async fn test_send_without_connection_fails() {
    let server = MockServer::new();
    let mut transport = server.transport();
    let result = transport.send("{}".to_string()).await;
    assert!(matches!(result, Err(TransportError::Closed)));
}

#[test]
fn test_websocket_transport_starts_disconnected() {
    let transport = super::transport::WebSocketTransport::new();
    assert!(!transport.is_connected());
}
