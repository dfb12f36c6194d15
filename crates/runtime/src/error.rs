//! Error types for the CDP runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a browser over CDP.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to establish the WebSocket connection.
	#[error("Failed to connect to CDP endpoint: {0}")]
	ConnectionFailed(String),

	/// Transport-level error (WebSocket frames).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Protocol-level error (malformed or unexpected JSON-RPC message).
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// Error returned by the browser for a command.
	#[error("{method}: {message} (code {code})")]
	Remote {
		/// CDP method that failed
		method: String,
		/// JSON-RPC error code
		code: i64,
		/// Human-readable error message
		message: String,
	},

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Timeout waiting for a response or event.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// Connection closed while a command was in flight.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,
}

impl Error {
	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}

	/// Returns true if the connection to the tab is gone.
	pub fn is_closed(&self) -> bool {
		matches!(self, Error::ChannelClosed | Error::ConnectionFailed(_))
	}
}
