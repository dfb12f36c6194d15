//! JSON-RPC connection layer for the Chrome DevTools Protocol.
//!
//! This module implements request/response correlation on top of a
//! [`Transport`](crate::transport::Transport):
//!
//! 1. [`Connection::send`] assigns a unique id and registers a oneshot channel
//! 2. The request is queued to the writer task
//! 3. The dispatch loop correlates the response by id and completes the channel
//! 4. Messages without an id are events and are broadcast to subscribers
//!
//! A command that does not complete within the connection timeout fails with
//! [`Error::Timeout`]; its callback is removed so a late response is dropped.


use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::{Error, Result};
use crate::transport::{TransportParts, WebSocketTransport};

/// Default per-command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound CDP command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Unique request id for correlating the response
	pub id: u64,
	/// Domain-qualified method name (e.g. `Page.navigate`)
	pub method: String,
	/// Method parameters
	pub params: Value,
}

/// Response to a [`Request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	pub id: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

/// JSON-RPC error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	#[serde(default)]
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
}

/// Event pushed by the browser (no `id` field).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
	pub method: String,
	#[serde(default)]
	pub params: Value,
}

/// Discriminated union of inbound messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Response message (has `id` field)
	Response(Response),
	/// Event message (has `method`, no `id`)
	Event(Event),
	/// Unknown message type (forward-compatible catch-all)
	Unknown(Value),
}

/// Pending request callbacks keyed by request id. Each entry remembers the
/// method so remote errors can name it.
type CallbackMap = Arc<TokioMutex<HashMap<u64, (String, oneshot::Sender<Result<Value>>)>>>;

/// RAII guard ensuring callback cleanup when a request future is dropped.
struct CancelGuard {
	id: u64,
	callbacks: CallbackMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: u64, callbacks: CallbackMap) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}

		let id = self.id;
		let callbacks = Arc::clone(&self.callbacks);

		if let Ok(handle) = tokio::runtime::Handle::try_current() {
			handle.spawn(async move {
				if callbacks.lock().await.remove(&id).is_some() {
					tracing::debug!(id, "CancelGuard: removed orphaned callback");
				}
			});
		}
	}
}

/// Future returned by [`Connection::send`] with automatic cancellation cleanup.
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// JSON-RPC connection to a single CDP target.
pub struct Connection {
	last_id: AtomicU64,
	callbacks: CallbackMap,
	outbound_tx: mpsc::UnboundedSender<Value>,
	events: broadcast::Sender<Event>,
	closed: Arc<AtomicBool>,
	timeout: Duration,
}

impl Connection {
	/// Connects to a target's `webSocketDebuggerUrl` and starts the message loop.
	pub async fn connect(url: &str, timeout: Duration) -> Result<Arc<Self>> {
		let parts = WebSocketTransport::connect(url).await?;
		Ok(Self::start(parts, timeout))
	}

	/// Starts reader, writer and dispatch tasks over `parts`.
	///
	/// Must be called from within a tokio runtime.
	pub fn start(parts: TransportParts, timeout: Duration) -> Arc<Self> {
		let TransportParts {
			mut sender,
			receiver,
			mut message_rx,
		} = parts;

		let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Value>();
		let (events, _) = broadcast::channel(256);
		let connection = Arc::new(Self {
			last_id: AtomicU64::new(0),
			callbacks: Arc::new(TokioMutex::new(HashMap::new())),
			outbound_tx,
			events,
			closed: Arc::new(AtomicBool::new(false)),
			timeout,
		});

		tokio::spawn(async move {
			if let Err(e) = receiver.run().await {
				tracing::error!("Transport read error: {}", e);
			}
		});

		tokio::spawn(async move {
			while let Some(message) = outbound_rx.recv().await {
				if let Err(e) = sender.send(message).await {
					tracing::error!("Transport write error: {}", e);
					break;
				}
			}
		});

		let dispatcher = Arc::clone(&connection);
		tokio::spawn(async move {
			while let Some(value) = message_rx.recv().await {
				match serde_json::from_value::<Message>(value) {
					Ok(message) => {
						if let Err(e) = dispatcher.dispatch(message).await {
							tracing::warn!("Error dispatching message: {}", e);
						}
					}
					Err(e) => tracing::error!("Failed to parse message: {}", e),
				}
			}
			dispatcher.close().await;
		});

		connection
	}

	/// Returns the per-command timeout.
	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Returns true once the transport has shut down.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Subscribes to events. Subscribe before issuing the command that triggers
	/// the event to avoid missing it.
	pub fn subscribe(&self) -> broadcast::Receiver<Event> {
		self.events.subscribe()
	}

	/// Sends a command and awaits its result.
	pub async fn send(&self, method: &str, params: Value) -> Result<Value> {
		if self.is_closed() {
			return Err(Error::ChannelClosed);
		}

		let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
		tracing::trace!(id, method, "sending command");

		let (tx, rx) = oneshot::channel();
		{
			// close() sets the flag before it drains under this lock
			let mut callbacks = self.callbacks.lock().await;
			if self.is_closed() {
				return Err(Error::ChannelClosed);
			}
			callbacks.insert(id, (method.to_string(), tx));
		}
		let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

		let request = Request {
			id,
			method: method.to_string(),
			params,
		};
		if self.outbound_tx.send(serde_json::to_value(&request)?).is_err() {
			tracing::error!("Failed to queue message: outbound channel closed");
			return Err(Error::ChannelClosed);
		}

		match tokio::time::timeout(self.timeout, ResponseFuture { rx, guard }).await {
			Ok(result) => result,
			Err(_) => Err(Error::Timeout(format!("{method} did not respond within {}ms", self.timeout.as_millis()))),
		}
	}

	/// Waits on `events` for the next event named `method`.
	pub async fn wait_for_event(&self, events: &mut broadcast::Receiver<Event>, method: &str) -> Result<Event> {
		let wait = async {
			loop {
				match events.recv().await {
					Ok(event) if event.method == method => return Ok(event),
					Ok(_) => continue,
					Err(broadcast::error::RecvError::Lagged(skipped)) => {
						tracing::debug!(skipped, "event subscriber lagged");
					}
					Err(broadcast::error::RecvError::Closed) => return Err(Error::ChannelClosed),
				}
			}
		};

		match tokio::time::timeout(self.timeout, wait).await {
			Ok(result) => result,
			Err(_) => Err(Error::Timeout(format!("no {method} event within {}ms", self.timeout.as_millis()))),
		}
	}

	async fn dispatch(&self, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				let (method, callback) = self
					.callbacks
					.lock()
					.await
					.remove(&response.id)
					.ok_or_else(|| Error::ProtocolError(format!("Cannot find request to respond: id={}", response.id)))?;

				let result = match response.error {
					Some(error) => Err(Error::Remote {
						method,
						code: error.code,
						message: match error.data {
							Some(data) => format!("{} ({data})", error.message),
							None => error.message,
						},
					}),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};

				let _ = callback.send(result);
				Ok(())
			}
			Message::Event(event) => {
				tracing::trace!(method = %event.method, "event");
				// No subscribers is fine.
				let _ = self.events.send(event);
				Ok(())
			}
			Message::Unknown(value) => {
				tracing::debug!("Ignoring unknown message: {}", value);
				Ok(())
			}
		}
	}

	async fn close(&self) {
		self.closed.store(true, Ordering::SeqCst);
		let pending: Vec<_> = self.callbacks.lock().await.drain().collect();
		for (_, (_, callback)) in pending {
			let _ = callback.send(Err(Error::ChannelClosed));
		}
	}
}
