use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	/// Capturing or writing the snapshot failed.
	#[error("failed to save {}: {source}", path.display())]
	Save {
		path: PathBuf,
		#[source]
		source: pw_state::Error,
	},

	/// Loading or applying the snapshot failed.
	#[error("failed to restore {}: {source}", path.display())]
	Restore {
		path: PathBuf,
		#[source]
		source: pw_state::Error,
	},

	#[error("failed to read {}: {source}", path.display())]
	Show {
		path: PathBuf,
		#[source]
		source: pw_state::Error,
	},

	/// The endpoint answered but lists no page to attach to.
	#[error("no page target at {endpoint}; open a tab in the browser first")]
	NoPageTarget { endpoint: String },

	/// The endpoint could not be queried for targets.
	#[error(
		"no browser with remote debugging found at {endpoint}: {source:#}\n\
		 Try running: google-chrome --remote-debugging-port=9222"
	)]
	Discovery {
		endpoint: String,
		#[source]
		source: anyhow::Error,
	},

	/// No browser could be reached for the snapshot at `path`.
	#[error("cannot reach a browser for {}: {source}", path.display())]
	Connect {
		path: PathBuf,
		#[source]
		source: Box<CliError>,
	},

	/// Attaching to the discovered tab failed.
	#[error(transparent)]
	Attach(#[from] pw_state::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Maps an engine error to a code, looking through restore wrappers.
fn classify(err: &pw_state::Error) -> ErrorCode {
	use pw_state::Error;

	match err.root() {
		Error::SessionUnavailable => ErrorCode::SessionUnavailable,
		Error::NotFound { .. } => ErrorCode::NotFound,
		Error::Parse { .. } => ErrorCode::ParseError,
		Error::Io { .. } => ErrorCode::IoError,
		Error::Navigation { .. } => ErrorCode::NavigationFailed,
		Error::ScriptEvaluation(_) => ErrorCode::JsEvalFailed,
		Error::Session(_) => ErrorCode::SessionError,
		Error::Cdp(e) if e.is_timeout() => ErrorCode::Timeout,
		Error::Cdp(e) if e.is_closed() => ErrorCode::SessionUnavailable,
		Error::Cdp(_) => ErrorCode::SessionError,
		Error::Encode(_) | Error::Restore { .. } => ErrorCode::InternalError,
	}
}

fn engine_details(path: &Path, err: &pw_state::Error) -> Value {
	let mut details = Map::new();
	details.insert("path".into(), json!(path));
	if let Some(progress) = err.progress() {
		details.insert(
			"progress".into(),
			json!({
				"stage": progress.stage.to_string(),
				"cookiesApplied": progress.cookies_applied,
				"originsCompleted": progress.origins_completed,
				"navigations": progress.navigations,
				"entriesWritten": progress.entries_written,
				"partial": progress.is_partial(),
			}),
		);
	}
	Value::Object(details)
}

impl CliError {
	/// Attaches the snapshot path to a failure to reach the browser.
	pub fn for_snapshot(self, path: &Path) -> Self {
		CliError::Connect {
			path: path.to_path_buf(),
			source: Box::new(self),
		}
	}

	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let message = self.to_string();
		let (code, details) = match self {
			CliError::Save { path, source } | CliError::Restore { path, source } | CliError::Show { path, source } => {
				(classify(source), Some(engine_details(path, source)))
			}
			CliError::NoPageTarget { endpoint } | CliError::Discovery { endpoint, .. } => {
				(ErrorCode::SessionUnavailable, Some(json!({ "endpoint": endpoint })))
			}
			CliError::Connect { path, source } => {
				let inner = source.to_command_error();
				let mut details = match inner.details {
					Some(Value::Object(details)) => details,
					_ => Map::new(),
				};
				details.insert("path".into(), json!(path));
				(inner.code, Some(Value::Object(details)))
			}
			CliError::Attach(err) => (classify(err), None),
			CliError::Io(_) => (ErrorCode::IoError, None),
		};

		CommandError { code, message, details }
	}
}
