// Shared test support: a channel-backed transport and a recording
// presenter, so session behavior can be driven without a network.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use portico_stream::conversation::Presenter;
use portico_stream::stream::{
    EventReceiver, SessionEvent, Transport, TransportMessage,
};
use portico_stream::Intent;
use std::time::Duration;
use tokio::sync::mpsc;

/// Frame captured from the session's outbound side.
#[derive(Debug, Clone, PartialEq)]
pub enum SentFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// In-memory transport; the test side holds a `MockHandle`.
pub struct MockTransport {
    inbound: mpsc::UnboundedReceiver<Result<TransportMessage>>,
    sent: mpsc::UnboundedSender<SentFrame>,
}

/// Test-side controls: push inbound frames, observe outbound frames.
pub struct MockHandle {
    pub inbound: mpsc::UnboundedSender<Result<TransportMessage>>,
    pub sent: mpsc::UnboundedReceiver<SentFrame>,
}

pub fn mock_transport() -> (MockTransport, MockHandle) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    (
        MockTransport {
            inbound: inbound_rx,
            sent: sent_tx,
        },
        MockHandle {
            inbound: inbound_tx,
            sent: sent_rx,
        },
    )
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.sent
            .send(SentFrame::Text(text))
            .map_err(|_| anyhow!("test sink closed"))
    }

    async fn send_binary(&mut self, data: Vec<u8>) -> Result<()> {
        self.sent
            .send(SentFrame::Binary(data))
            .map_err(|_| anyhow!("test sink closed"))
    }

    async fn next_message(&mut self) -> Option<Result<TransportMessage>> {
        self.inbound.recv().await
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl MockHandle {
    /// Push an inbound text frame, as if the server sent it.
    pub fn push_text(&self, text: &str) {
        self.inbound
            .send(Ok(TransportMessage::Text(text.to_string())))
            .expect("driver gone");
    }

    /// Push a transport-level read error.
    pub fn push_error(&self, message: &str) {
        self.inbound
            .send(Err(anyhow!("{}", message)))
            .expect("driver gone");
    }
}

/// Wait for the next outbound frame, failing the test after a second.
pub async fn expect_sent(handle: &mut MockHandle) -> SentFrame {
    tokio::time::timeout(Duration::from_secs(1), handle.sent.recv())
        .await
        .expect("timed out waiting for an outbound frame")
        .expect("outbound channel closed")
}

/// Assert no outbound frame arrives within a settle window.
pub async fn expect_nothing_sent(handle: &mut MockHandle) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(
        handle.sent.try_recv().is_err(),
        "expected no outbound frames"
    );
}

/// Poll the dispatcher until an event arrives or the timeout elapses.
pub async fn wait_for_event(events: &mut EventReceiver) -> Option<SessionEvent> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        if let Some(event) = events.poll() {
            return Some(event);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    None
}

/// Poll the dispatcher until the predicate matches, discarding earlier
/// events. Returns the matching event.
pub async fn wait_for<F>(events: &mut EventReceiver, pred: F) -> SessionEvent
where
    F: Fn(&SessionEvent) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        if let Some(event) = events.poll() {
            if pred(&event) {
                return event;
            }
            continue;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for a matching session event");
}

/// Presenter that records every call for assertions.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub statuses: Vec<String>,
    pub hypotheses: Vec<String>,
    pub recognitions: Vec<(String, String)>,
    pub intent_lists: Vec<Vec<Intent>>,
    pub responses: Vec<String>,
}

impl Presenter for RecordingPresenter {
    fn status(&mut self, status: &str) {
        self.statuses.push(status.to_string());
    }

    fn hypothesis(&mut self, text: &str) {
        self.hypotheses.push(text.to_string());
    }

    fn recognition(&mut self, text: &str, label: &str) {
        self.recognitions.push((text.to_string(), label.to_string()));
    }

    fn intents(&mut self, intents: &[Intent]) {
        self.intent_lists.push(intents.to_vec());
    }

    fn response(&mut self, reply: &str) {
        self.responses.push(reply.to_string());
    }
}
