//! Session state machine.
//!
//! Every caller command and every transport notification funnels through
//! `SessionFsm::handle`, which returns the effects to apply. State is
//! mutated nowhere else, so idempotency rules (double start, stop before
//! start, audio outside a started stream) live in exactly one place.

use super::dispatcher::SessionEvent;
use super::protocol::{ControlMessage, ServerMessage};
use crate::audio::AudioChunk;
use tracing::debug;

/// Externally visible session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Transport open, awaiting the server's session classification
    Connecting,
    /// Server accepted the session; not streaming
    Ready,
    /// Streaming control sent; audio frames flow
    Streaming,
    /// Streaming stopped; can start again without reconnecting
    Stopped,
    /// Server rejected the session. The transport stays open per the
    /// server contract, but the session is unusable until the caller
    /// reconnects.
    Failed,
    Disconnected,
}

/// Caller-issued command, delivered over the command channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    SendAudio(AudioChunk),
    Disconnect,
}

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Transport finished opening
    Opened,
    Command(Command),
    Inbound(ServerMessage),
    TransportError(String),
    /// Server closed the socket
    Closed,
}

/// Effect requested by a transition. The driver applies these in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SendControl(ControlMessage),
    SendBinary(Vec<u8>),
    Emit(SessionEvent),
    CloseTransport,
}

#[derive(Debug)]
pub struct SessionFsm {
    state: StreamState,
    sample_rate: u32,
}

impl SessionFsm {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state: StreamState::Connecting,
            sample_rate,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The single transition function.
    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        use StreamState::*;

        match input {
            Input::Opened => vec![Effect::Emit(SessionEvent::Connected)],

            Input::Inbound(ServerMessage::Ready { server_id }) => {
                if self.state == Connecting {
                    self.state = Ready;
                    vec![Effect::Emit(SessionEvent::Ready { server_id })]
                } else {
                    debug!("ignoring ready message in state {:?}", self.state);
                    vec![]
                }
            }

            Input::Inbound(ServerMessage::Failure { server_id }) => {
                // Server contract: the socket stays open after a failure.
                self.state = Failed;
                vec![Effect::Emit(SessionEvent::Failed { server_id })]
            }

            Input::Inbound(ServerMessage::Intent(result)) => {
                vec![Effect::Emit(SessionEvent::Intent(result))]
            }

            Input::Command(Command::Start) => match self.state {
                Ready | Stopped => {
                    self.state = Streaming;
                    vec![
                        Effect::SendControl(ControlMessage::Start {
                            sample_rate: self.sample_rate,
                        }),
                        Effect::Emit(SessionEvent::StreamingStarted),
                    ]
                }
                _ => vec![],
            },

            Input::Command(Command::Stop) => match self.state {
                Streaming => {
                    self.state = Stopped;
                    vec![
                        Effect::SendControl(ControlMessage::Stop),
                        Effect::Emit(SessionEvent::StreamingStopped),
                    ]
                }
                _ => vec![],
            },

            Input::Command(Command::SendAudio(chunk)) => match self.state {
                Streaming => vec![Effect::SendBinary(chunk.into_bytes())],
                _ => {
                    debug!("dropping {}-byte chunk in state {:?}", chunk.len(), self.state);
                    vec![]
                }
            },

            Input::Command(Command::Disconnect) => {
                if self.state == Disconnected {
                    vec![]
                } else {
                    self.state = Disconnected;
                    vec![
                        Effect::CloseTransport,
                        Effect::Emit(SessionEvent::Disconnected),
                    ]
                }
            }

            Input::TransportError(message) => {
                if self.state == Disconnected {
                    vec![]
                } else {
                    self.state = Disconnected;
                    vec![
                        Effect::Emit(SessionEvent::TransportError(message)),
                        Effect::CloseTransport,
                        Effect::Emit(SessionEvent::Disconnected),
                    ]
                }
            }

            Input::Closed => {
                if self.state == Disconnected {
                    vec![]
                } else {
                    self.state = Disconnected;
                    vec![Effect::Emit(SessionEvent::Disconnected)]
                }
            }
        }
    }
}
