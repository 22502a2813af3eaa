// Session state machine tests: transition-function units plus driver
// integration over an in-memory transport.

mod common;

use common::{expect_nothing_sent, expect_sent, mock_transport, wait_for, SentFrame};
use portico_stream::audio::AudioChunk;
use portico_stream::stream::{
    event_queue, Command, ControlMessage, Effect, Input, ServerMessage, SessionEvent, SessionFsm,
    StreamSession, StreamState,
};

fn ready_fsm() -> SessionFsm {
    let mut fsm = SessionFsm::new(44100);
    fsm.handle(Input::Opened);
    fsm.handle(Input::Inbound(ServerMessage::Ready {
        server_id: "s1".to_string(),
    }));
    assert_eq!(fsm.state(), StreamState::Ready);
    fsm
}

fn control_sends(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::SendControl(_)))
        .count()
}

fn binary_sends(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::SendBinary(_)))
        .count()
}

#[test]
fn test_double_start_sends_one_control() {
    let mut fsm = ready_fsm();

    let first = fsm.handle(Input::Command(Command::Start));
    assert_eq!(control_sends(&first), 1);
    assert!(first.contains(&Effect::SendControl(ControlMessage::Start {
        sample_rate: 44100
    })));

    let second = fsm.handle(Input::Command(Command::Start));
    assert_eq!(control_sends(&second), 0, "second start must be a no-op");
    assert_eq!(fsm.state(), StreamState::Streaming);
}

#[test]
fn test_stop_before_start_sends_nothing() {
    let mut fsm = ready_fsm();

    let effects = fsm.handle(Input::Command(Command::Stop));
    assert!(effects.is_empty());
    assert_eq!(fsm.state(), StreamState::Ready);
}

#[test]
fn test_start_stop_start_cycle() {
    let mut fsm = ready_fsm();

    assert_eq!(control_sends(&fsm.handle(Input::Command(Command::Start))), 1);
    assert_eq!(control_sends(&fsm.handle(Input::Command(Command::Stop))), 1);
    assert_eq!(fsm.state(), StreamState::Stopped);
    // A stopped session can start again without reconnecting.
    assert_eq!(control_sends(&fsm.handle(Input::Command(Command::Start))), 1);
    assert_eq!(fsm.state(), StreamState::Streaming);
}

#[test]
fn test_audio_gated_on_streaming_state() {
    let mut fsm = ready_fsm();
    let chunk = AudioChunk {
        bytes: vec![0u8; 32],
    };

    // Before start
    assert_eq!(
        binary_sends(&fsm.handle(Input::Command(Command::SendAudio(chunk.clone())))),
        0
    );

    fsm.handle(Input::Command(Command::Start));
    assert_eq!(
        binary_sends(&fsm.handle(Input::Command(Command::SendAudio(chunk.clone())))),
        1
    );

    fsm.handle(Input::Command(Command::Stop));
    assert_eq!(
        binary_sends(&fsm.handle(Input::Command(Command::SendAudio(chunk)))),
        0,
        "audio after stop must be dropped"
    );
}

#[test]
fn test_start_before_ready_is_noop() {
    let mut fsm = SessionFsm::new(44100);
    fsm.handle(Input::Opened);

    assert!(fsm.handle(Input::Command(Command::Start)).is_empty());
    assert_eq!(fsm.state(), StreamState::Connecting);
}

#[test]
fn test_failure_keeps_transport_open() {
    let mut fsm = SessionFsm::new(44100);
    fsm.handle(Input::Opened);

    let effects = fsm.handle(Input::Inbound(ServerMessage::Failure {
        server_id: "s1".to_string(),
    }));

    assert_eq!(fsm.state(), StreamState::Failed);
    assert!(effects.contains(&Effect::Emit(SessionEvent::Failed {
        server_id: "s1".to_string()
    })));
    assert!(
        !effects.contains(&Effect::CloseTransport),
        "server failure must not close the socket"
    );
    // The failed session is unusable.
    assert!(fsm.handle(Input::Command(Command::Start)).is_empty());
}

#[test]
fn test_transport_error_forces_disconnect() {
    let mut fsm = ready_fsm();
    fsm.handle(Input::Command(Command::Start));

    let effects = fsm.handle(Input::TransportError("broken pipe".to_string()));

    assert_eq!(fsm.state(), StreamState::Disconnected);
    assert!(effects.contains(&Effect::Emit(SessionEvent::TransportError(
        "broken pipe".to_string()
    ))));
    assert!(effects.contains(&Effect::Emit(SessionEvent::Disconnected)));
    // Commands after collapse are no-ops.
    assert!(fsm.handle(Input::Command(Command::Start)).is_empty());
}

#[test]
fn test_server_close_disconnects() {
    let mut fsm = ready_fsm();
    let effects = fsm.handle(Input::Closed);
    assert_eq!(fsm.state(), StreamState::Disconnected);
    assert!(effects.contains(&Effect::Emit(SessionEvent::Disconnected)));
}

#[tokio::test]
async fn test_driver_ready_handshake() {
    let (transport, mut handle) = mock_transport();
    let (events, mut event_rx) = event_queue();
    let _session = StreamSession::with_transport(Box::new(transport), 44100, events);

    wait_for(&mut event_rx, |e| *e == SessionEvent::Connected).await;

    handle.push_text(r#"{"type":"ready","id":"s1"}"#);
    let event = wait_for(&mut event_rx, |e| matches!(e, SessionEvent::Ready { .. })).await;
    assert_eq!(
        event,
        SessionEvent::Ready {
            server_id: "s1".to_string()
        }
    );
}

#[tokio::test]
async fn test_driver_double_start_sends_one_frame() {
    let (transport, mut handle) = mock_transport();
    let (events, mut event_rx) = event_queue();
    let session = StreamSession::with_transport(Box::new(transport), 44100, events);

    handle.push_text(r#"{"type":"ready","id":"s1"}"#);
    wait_for(&mut event_rx, |e| matches!(e, SessionEvent::Ready { .. })).await;

    session.start();
    session.start();

    let frame = expect_sent(&mut handle).await;
    match frame {
        SentFrame::Text(text) => {
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(value["action"], "start");
            assert_eq!(value["sampleRate"], 44100);
        }
        other => panic!("expected a text frame, got {:?}", other),
    }
    expect_nothing_sent(&mut handle).await;
}

#[tokio::test]
async fn test_driver_stop_without_start_sends_nothing() {
    let (transport, mut handle) = mock_transport();
    let (events, mut event_rx) = event_queue();
    let session = StreamSession::with_transport(Box::new(transport), 44100, events);

    handle.push_text(r#"{"type":"ready","id":"s1"}"#);
    wait_for(&mut event_rx, |e| matches!(e, SessionEvent::Ready { .. })).await;

    session.stop();
    session.send_audio(AudioChunk {
        bytes: vec![0u8; 64],
    });
    expect_nothing_sent(&mut handle).await;
}

#[tokio::test]
async fn test_driver_unknown_and_malformed_messages_ignored() {
    let (transport, mut handle) = mock_transport();
    let (events, mut event_rx) = event_queue();
    let _session = StreamSession::with_transport(Box::new(transport), 44100, events);

    handle.push_text(r#"{"type":"heartbeat","seq":7}"#);
    handle.push_text("this is not json");
    handle.push_text(r#"{"type":"ready","id":"s1"}"#);

    // The session survives both and still reaches ready.
    let event = wait_for(&mut event_rx, |e| matches!(e, SessionEvent::Ready { .. })).await;
    assert_eq!(
        event,
        SessionEvent::Ready {
            server_id: "s1".to_string()
        }
    );
}

#[tokio::test]
async fn test_driver_disconnect_finishes() {
    let (transport, _handle) = mock_transport();
    let (events, mut event_rx) = event_queue();
    let session = StreamSession::with_transport(Box::new(transport), 44100, events);

    session.disconnect();
    wait_for(&mut event_rx, |e| *e == SessionEvent::Disconnected).await;
    session.closed().await;
}

#[tokio::test]
async fn test_driver_transport_error_reports_and_disconnects() {
    let (transport, handle) = mock_transport();
    let (events, mut event_rx) = event_queue();
    let session = StreamSession::with_transport(Box::new(transport), 44100, events);

    handle.push_error("connection reset");

    let event = wait_for(&mut event_rx, |e| {
        matches!(e, SessionEvent::TransportError(_))
    })
    .await;
    match event {
        SessionEvent::TransportError(message) => {
            assert!(message.contains("connection reset"));
        }
        other => panic!("unexpected event {:?}", other),
    }
    wait_for(&mut event_rx, |e| *e == SessionEvent::Disconnected).await;
    session.closed().await;
}

#[tokio::test]
async fn test_driver_server_close_disconnects() {
    let (transport, handle) = mock_transport();
    let (events, mut event_rx) = event_queue();
    let session = StreamSession::with_transport(Box::new(transport), 44100, events);

    drop(handle.inbound);

    wait_for(&mut event_rx, |e| *e == SessionEvent::Disconnected).await;
    session.closed().await;
}
