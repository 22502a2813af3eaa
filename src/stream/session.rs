use super::dispatcher::EventSender;
use super::fsm::{Command, Effect, Input, SessionFsm, StreamState};
use super::protocol::{classify, streaming_url};
use super::transport::{Transport, TransportMessage, WsTransport};
use crate::audio::AudioChunk;
use crate::config::ApiConfig;
use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Caller-facing handle for one streaming connection.
///
/// The handle lives in the consumer domain; the socket and the state
/// machine live in a driver task. Commands cross over an unbounded
/// channel so `start`/`stop`/`send_audio` never block, and every command
/// is validated against the authoritative state inside the driver, which
/// makes all of them safe to call regardless of connection state.
pub struct StreamSession {
    commands: mpsc::UnboundedSender<Command>,
    driver: JoinHandle<()>,
}

impl StreamSession {
    /// Open a connection to the realtime prediction endpoint.
    ///
    /// Fails fast, before any network activity, when the auth token is
    /// empty. The session only becomes usable once the server sends its
    /// "ready" classification (surfaced as `SessionEvent::Ready`).
    pub async fn connect(api: &ApiConfig, sample_rate: u32, events: EventSender) -> Result<Self> {
        if api.token.is_empty() {
            bail!("auth token is empty; set api.token before connecting");
        }

        let url = streaming_url(&api.host, &api.model_id, &api.token, &api.user_id);
        info!("connecting to {}/model/{}/predict-rt", api.host, api.model_id);

        let transport = WsTransport::connect(&url).await?;
        Ok(Self::with_transport(Box::new(transport), sample_rate, events))
    }

    /// Build a session over an already-open transport. Used directly by
    /// tests; `connect` goes through here too.
    pub fn with_transport(
        transport: Box<dyn Transport>,
        sample_rate: u32,
        events: EventSender,
    ) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(run_driver(transport, command_rx, events, sample_rate));
        Self { commands, driver }
    }

    /// Ask the server to begin streaming. No-op unless the session is
    /// ready (or stopped after a previous start).
    pub fn start(&self) {
        let _ = self.commands.send(Command::Start);
    }

    /// Ask the server to stop streaming. No-op unless streaming.
    pub fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }

    /// Hand one encoded chunk to the transport. Dropped silently unless
    /// the stream has been started, so stray audio after a stop never
    /// violates the protocol.
    pub fn send_audio(&self, chunk: AudioChunk) {
        let _ = self.commands.send(Command::SendAudio(chunk));
    }

    /// Tear the session down. Any in-flight audio is discarded.
    pub fn disconnect(&self) {
        let _ = self.commands.send(Command::Disconnect);
    }

    /// Wait for the driver task to finish (after `disconnect`, a server
    /// close, or a transport error).
    pub async fn closed(self) {
        let _ = self.driver.await;
    }
}

/// Transport-domain loop: owns the socket and the state machine.
///
/// This is the only place session state is read or written. Inbound
/// frames and caller commands are serialized through the select below,
/// so transitions never race.
async fn run_driver(
    mut transport: Box<dyn Transport>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: EventSender,
    sample_rate: u32,
) {
    let mut fsm = SessionFsm::new(sample_rate);

    if let Err(e) = apply_effects(&mut transport, &events, fsm.handle(Input::Opened)).await {
        let effects = fsm.handle(Input::TransportError(e.to_string()));
        let _ = apply_effects(&mut transport, &events, effects).await;
        return;
    }

    while fsm.state() != StreamState::Disconnected {
        let input = tokio::select! {
            command = commands.recv() => match command {
                Some(command) => Input::Command(command),
                // Every handle dropped: tear down.
                None => Input::Command(Command::Disconnect),
            },
            message = transport.next_message() => match message {
                Some(Ok(TransportMessage::Text(text))) => match classify(&text) {
                    Some(message) => Input::Inbound(message),
                    None => continue,
                },
                Some(Ok(TransportMessage::Binary(data))) => {
                    warn!("ignoring unexpected {}-byte binary frame", data.len());
                    continue;
                }
                Some(Err(e)) => Input::TransportError(e.to_string()),
                None => Input::Closed,
            },
        };

        let effects = fsm.handle(input);
        if let Err(e) = apply_effects(&mut transport, &events, effects).await {
            warn!("transport send failed: {}", e);
            let effects = fsm.handle(Input::TransportError(e.to_string()));
            let _ = apply_effects(&mut transport, &events, effects).await;
        }
    }

    info!("session driver finished");
}

async fn apply_effects(
    transport: &mut Box<dyn Transport>,
    events: &EventSender,
    effects: Vec<Effect>,
) -> Result<()> {
    for effect in effects {
        match effect {
            Effect::SendControl(message) => {
                let text = serde_json::to_string(&message)?;
                transport.send_text(text).await?;
            }
            Effect::SendBinary(data) => {
                transport.send_binary(data).await?;
            }
            Effect::Emit(event) => {
                events.emit(event);
            }
            Effect::CloseTransport => {
                if let Err(e) = transport.close().await {
                    warn!("error closing transport: {}", e);
                }
            }
        }
    }
    Ok(())
}
