//! Error types for capture, persistence and restore.

use std::path::PathBuf;

use thiserror::Error;

use crate::restore::RestoreProgress;

/// Result type alias for pw-state operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while saving or restoring session state.
///
/// Every error aborts the operation that produced it; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
	/// No active browser tab to read from or write to.
	#[error("no active browser session")]
	SessionUnavailable,

	/// Reading, writing or creating directories failed.
	#[error("I/O error at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// Snapshot file does not exist.
	#[error("snapshot not found: {path}")]
	NotFound { path: PathBuf },

	/// Snapshot file is not valid JSON or does not have the snapshot shape.
	#[error("invalid snapshot {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	/// Snapshot could not be encoded.
	#[error("failed to encode snapshot: {0}")]
	Encode(#[source] serde_json::Error),

	/// The tab failed to navigate.
	#[error("navigation to {url} failed: {message}")]
	Navigation { url: String, message: String },

	/// An in-page script threw or could not be delivered.
	#[error("script evaluation failed: {0}")]
	ScriptEvaluation(String),

	/// Any other failure reported by the session (cookie jar, storage reads).
	#[error("session error: {0}")]
	Session(String),

	/// Transport failure talking to the browser.
	#[error(transparent)]
	Cdp(#[from] pw_state_runtime::Error),

	/// A restore stopped part way through. State applied before the failure
	/// is left in place.
	#[error("restore aborted ({progress}): {source}")]
	Restore {
		progress: RestoreProgress,
		#[source]
		source: Box<Error>,
	},
}

impl Error {
	/// Returns the underlying error, unwrapping [`Error::Restore`].
	pub fn root(&self) -> &Error {
		match self {
			Error::Restore { source, .. } => source.root(),
			other => other,
		}
	}

	/// Returns the restore progress if this error came out of a restore.
	pub fn progress(&self) -> Option<&RestoreProgress> {
		match self {
			Error::Restore { progress, .. } => Some(progress),
			_ => None,
		}
	}

	/// Returns true if the session may hold part of the snapshot.
	pub fn is_partial(&self) -> bool {
		self.progress().is_some_and(RestoreProgress::is_partial)
	}
}
