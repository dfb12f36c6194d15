//! Structured output envelope for all commands.
//!
//! Every command produces a result envelope on stdout:
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": true,
//!   "command": "save",
//!   "data": { ... },
//!   "timings": { "durationMs": 412 }
//! }
//! ```
//!
//! On failure:
//!
//! ```json
//! {
//!   "ok": false,
//!   "command": "restore",
//!   "error": {
//!     "code": "NAVIGATION_FAILED",
//!     "message": "...",
//!     "details": { "path": "...", "progress": { ... } }
//!   }
//! }
//! ```


use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Current schema version for command output.
pub const SCHEMA_VERSION: u32 = 1;

/// Output format for command results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// JSON envelope (default)
	#[default]
	Json,
	/// Human-readable text
	Text,
}

/// The result envelope returned by all commands.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub schema_version: Option<u32>,

	pub ok: bool,

	/// Command name ("save", "restore", "show")
	pub command: String,

	/// Command-specific result data (only present on success)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,

	/// Error information (only present on failure)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,
}

/// Error information for failed commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,

	/// Human-readable error message
	pub message: String,

	/// Snapshot path, restore progress and similar context
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Standardized error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// No browser tab to attach to
	SessionUnavailable,
	/// Snapshot file does not exist
	NotFound,
	/// Snapshot file is malformed
	ParseError,
	/// File I/O error
	IoError,
	/// Navigation to an origin failed
	NavigationFailed,
	/// In-page script failed
	JsEvalFailed,
	/// Browser call failed
	SessionError,
	/// Browser call timed out
	Timeout,
	/// Unknown/internal error
	InternalError,
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ErrorCode::SessionUnavailable => write!(f, "SESSION_UNAVAILABLE"),
			ErrorCode::NotFound => write!(f, "NOT_FOUND"),
			ErrorCode::ParseError => write!(f, "PARSE_ERROR"),
			ErrorCode::IoError => write!(f, "IO_ERROR"),
			ErrorCode::NavigationFailed => write!(f, "NAVIGATION_FAILED"),
			ErrorCode::JsEvalFailed => write!(f, "JS_EVAL_FAILED"),
			ErrorCode::SessionError => write!(f, "SESSION_ERROR"),
			ErrorCode::Timeout => write!(f, "TIMEOUT"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}

/// Timing information for the command
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	/// Total duration in milliseconds
	pub duration_ms: u64,
}

impl From<Duration> for Timings {
	fn from(duration: Duration) -> Self {
		Timings {
			duration_ms: duration.as_millis() as u64,
		}
	}
}

/// Builder for constructing command results
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
		}
	}

	/// Set the successful result data
	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	/// Set a fully formed error, details included
	pub fn failure(mut self, error: CommandError) -> Self {
		self.error = Some(error);
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();

		CommandResult {
			schema_version: Some(SCHEMA_VERSION),
			ok,
			command: self.command,
			data: self.data,
			error: self.error,
			timings: Some(Timings::from(self.start_time.elapsed())),
		}
	}
}

/// Print a command result to stdout in the specified format.
///
/// Text output uses the data's `Display` impl.
pub fn print_result<T: Serialize + fmt::Display>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => print_json(result),
		OutputFormat::Text => {
			if let Some(data) = &result.data {
				println!("{data}");
			}
		}
	}
}

/// Print a command result as pretty JSON.
pub fn print_json<T: Serialize>(result: &CommandResult<T>) {
	if let Ok(json) = serde_json::to_string_pretty(result) {
		println!("{json}");
	}
}

/// Print an error to stderr in human-readable format
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}
