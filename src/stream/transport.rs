use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

/// Frame received from the socket.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportMessage {
    Text(String),
    Binary(Vec<u8>),
}

/// The socket seam of a streaming session.
///
/// `next_message` resolves to `None` once the peer has closed; errors are
/// transport failures the session treats as fatal. Tests substitute a
/// channel-backed implementation.
#[async_trait]
pub trait Transport: Send {
    async fn send_text(&mut self, text: String) -> Result<()>;
    async fn send_binary(&mut self, data: Vec<u8>) -> Result<()>;
    async fn next_message(&mut self) -> Option<Result<TransportMessage>>;
    async fn close(&mut self) -> Result<()>;
}

/// WebSocket transport over tokio-tungstenite.
pub struct WsTransport {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTransport {
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, response) = connect_async(url)
            .await
            .context("Failed to open websocket")?;
        info!("websocket connected (status {})", response.status());
        Ok(Self { ws })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.ws
            .send(Message::Text(text))
            .await
            .context("Failed to send text frame")
    }

    async fn send_binary(&mut self, data: Vec<u8>) -> Result<()> {
        self.ws
            .send(Message::Binary(data))
            .await
            .context("Failed to send binary frame")
    }

    async fn next_message(&mut self) -> Option<Result<TransportMessage>> {
        loop {
            match self.ws.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(TransportMessage::Text(text))),
                Ok(Message::Binary(data)) => return Some(Ok(TransportMessage::Binary(data))),
                Ok(Message::Close(frame)) => {
                    debug!("websocket closed by peer: {:?}", frame);
                    return None;
                }
                // tungstenite answers pings internally while being polled
                Ok(_) => continue,
                Err(e) => return Some(Err(anyhow::Error::new(e).context("Websocket read failed"))),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.ws.close(None).await.context("Failed to close websocket")
    }
}
