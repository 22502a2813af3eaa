//! Ordered hand-off queue between the transport task and the
//! single-threaded consumer.
//!
//! Transport callbacks enqueue fully-parsed events; the consumer drains
//! at most one event per tick so presentation updates stay in step with
//! its own cadence. Delivery is FIFO and lossless except for an explicit
//! `clear` on session reset.

use super::protocol::IntentResult;
use tokio::sync::mpsc;

/// Event delivered to the consumer side of a streaming session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Transport opened (server has not classified the session yet)
    Connected,
    /// Server accepted the session
    Ready { server_id: String },
    /// Server rejected the session; the transport stays open but the
    /// session is unusable
    Failed { server_id: String },
    /// Recognition result (interim or final)
    Intent(IntentResult),
    StreamingStarted,
    StreamingStopped,
    /// Transport-level failure; the session has collapsed to disconnected
    TransportError(String),
    Disconnected,
}

/// Producer half of the event queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSender {
    /// Enqueue an event. A dropped consumer is not an error; the event
    /// is simply discarded.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

/// Consumer half of the event queue.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl EventReceiver {
    /// Dequeue at most one event, without blocking.
    pub fn poll(&mut self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }

    /// Drop every queued event. Only used on session reset.
    pub fn clear(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

/// Create a connected (producer, consumer) pair.
pub fn event_queue() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}
