//! Streaming session protocol
//!
//! This module owns the realtime connection lifecycle:
//! - wire types and inbound message classification (`protocol`)
//! - the session state machine, a single transition function (`fsm`)
//! - the socket seam and its WebSocket implementation (`transport`)
//! - the caller-facing session handle and its driver task (`session`)
//! - the ordered event queue feeding the consumer (`dispatcher`)

pub mod dispatcher;
pub mod fsm;
pub mod protocol;
pub mod session;
pub mod transport;

pub use dispatcher::{event_queue, EventReceiver, EventSender, SessionEvent};
pub use fsm::{Command, Effect, Input, SessionFsm, StreamState};
pub use protocol::{classify, streaming_url, ControlMessage, Intent, IntentResult, ServerMessage, Transcript};
pub use session::StreamSession;
pub use transport::{Transport, TransportMessage, WsTransport};
