//! WebSocket transport for CDP messages.
//!
//! The transport is split in two halves: a [`Transport`] that writes JSON
//! frames and a [`TransportReceiver`] that reads frames and forwards parsed
//! JSON values over an mpsc channel until the socket closes.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{Error, Result};

/// Sending half of a transport.
#[async_trait]
pub trait Transport: Send {
	/// Writes one JSON message.
	async fn send(&mut self, message: Value) -> Result<()>;
}

/// Receiving half of a transport.
#[async_trait]
pub trait TransportReceiver: Send {
	/// Reads messages until the peer closes, forwarding each to the message channel.
	async fn run(self: Box<Self>) -> Result<()>;
}

/// Both halves of a transport plus the channel inbound messages arrive on.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// CDP transport over a WebSocket (`ws://` or `wss://`).
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Connects to `url` and returns the split transport.
	pub async fn connect(url: &str) -> Result<TransportParts> {
		tracing::debug!(url, "connecting websocket transport");
		let (stream, _response) = tokio_tungstenite::connect_async(url)
			.await
			.map_err(|e| Error::ConnectionFailed(format!("{url}: {e}")))?;
		let (sink, stream) = stream.split();
		let (message_tx, message_rx) = mpsc::unbounded_channel();

		Ok(TransportParts {
			sender: Box::new(WebSocketSender { sink }),
			receiver: Box::new(WebSocketReceiver { stream, message_tx }),
			message_rx,
		})
	}
}

struct WebSocketSender {
	sink: SplitSink<WsStream, WsMessage>,
}

#[async_trait]
impl Transport for WebSocketSender {
	async fn send(&mut self, message: Value) -> Result<()> {
		let text = serde_json::to_string(&message)?;
		self.sink
			.send(WsMessage::Text(text.into()))
			.await
			.map_err(|e| Error::TransportError(e.to_string()))
	}
}

struct WebSocketReceiver {
	stream: SplitStream<WsStream>,
	message_tx: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl TransportReceiver for WebSocketReceiver {
	async fn run(self: Box<Self>) -> Result<()> {
		let WebSocketReceiver { mut stream, message_tx } = *self;

		while let Some(frame) = stream.next().await {
			let frame = frame.map_err(|e| Error::TransportError(e.to_string()))?;
			let parsed = match frame {
				WsMessage::Text(text) => serde_json::from_str::<Value>(&text),
				WsMessage::Binary(bytes) => serde_json::from_slice::<Value>(&bytes),
				WsMessage::Close(_) => break,
				_ => continue,
			};
			let value = match parsed {
				Ok(value) => value,
				Err(e) => {
					tracing::warn!("Skipping malformed frame: {}", e);
					continue;
				}
			};
			if message_tx.send(value).is_err() {
				break;
			}
		}

		tracing::debug!("websocket transport closed");
		Ok(())
	}
}
