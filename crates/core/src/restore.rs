//! Replaying a snapshot into a live tab.
//!
//! Restore runs strictly in sequence against one tab:
//!
//! ```text
//! Start ─► CookiesApplied ─► (Navigating ─► Injecting)* ─► Done
//!   └──────────────┴──────────────┴─────────────┴──► Failed
//! ```
//!
//! 1. All cookies are added in one batch before any navigation, so the
//!    navigations that follow are already authenticated.
//! 2. Each origin is visited in order. The tab navigates only when its current
//!    URL does not already start with the origin, then one script call writes
//!    the origin's localStorage entries in order (later duplicates win).
//!
//! There is no rollback. A failure stops the restore and is reported as
//! [`Error::Restore`] carrying the [`RestoreProgress`] reached; whatever was
//! applied before that point stays applied.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::fs::Filesystem;
use crate::script::ScriptCall;
use crate::serializer::Serializer;
use crate::session::Session;
use crate::{OriginState, StorageState};

/// Where a restore is in its sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RestoreStage {
	#[default]
	Start,
	CookiesApplied,
	Navigating {
		origin: String,
	},
	Injecting {
		origin: String,
	},
	Done,
}

impl fmt::Display for RestoreStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Start => write!(f, "applying cookies"),
			Self::CookiesApplied => write!(f, "cookies applied"),
			Self::Navigating { origin } => write!(f, "navigating to {origin}"),
			Self::Injecting { origin } => write!(f, "writing localStorage for {origin}"),
			Self::Done => write!(f, "done"),
		}
	}
}

/// Counters for a restore, returned on success and attached to failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreProgress {
	pub stage: RestoreStage,
	/// Cookies handed to the cookie jar
	pub cookies_applied: usize,
	/// Origins fully processed
	pub origins_completed: usize,
	/// Navigations issued
	pub navigations: usize,
	/// localStorage entries written
	pub entries_written: usize,
}

impl RestoreProgress {
	/// Returns true if the session may already hold part of the snapshot.
	pub fn is_partial(&self) -> bool {
		self.cookies_applied > 0 || self.origins_completed > 0 || self.navigations > 0 || matches!(self.stage, RestoreStage::Injecting { .. })
	}
}

impl fmt::Display for RestoreProgress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} cookies and {} origins applied, stopped while {}",
			self.cookies_applied, self.origins_completed, self.stage
		)
	}
}

/// Applies `snapshot` to the session.
///
/// Duplicate origins in the snapshot are collapsed, the last one winning.
/// Restoring the same snapshot twice leaves the session as restoring it once.
pub async fn restore<S: Session + ?Sized>(session: &mut S, snapshot: &StorageState) -> Result<RestoreProgress> {
	if !session.is_active() {
		return Err(Error::SessionUnavailable);
	}

	let mut progress = RestoreProgress::default();
	match run(session, snapshot, &mut progress).await {
		Ok(()) => {
			progress.stage = RestoreStage::Done;
			info!(
				target = "pw_state",
				cookies = progress.cookies_applied,
				origins = progress.origins_completed,
				navigations = progress.navigations,
				entries = progress.entries_written,
				"session state restored"
			);
			Ok(progress)
		}
		Err(source) => {
			warn!(target = "pw_state", error = %source, stage = %progress.stage, "restore aborted");
			Err(Error::Restore {
				progress,
				source: Box::new(source),
			})
		}
	}
}

/// Loads the snapshot at `path` and restores it.
///
/// A missing or malformed file fails before the session is touched.
pub async fn restore_from_file<S, F>(session: &mut S, serializer: &Serializer<F>, path: &Path) -> Result<RestoreProgress>
where
	S: Session + ?Sized,
	F: Filesystem,
{
	let snapshot = serializer.load(path).await?;
	restore(session, &snapshot).await
}

async fn run<S: Session + ?Sized>(session: &mut S, snapshot: &StorageState, progress: &mut RestoreProgress) -> Result<()> {
	if !snapshot.cookies.is_empty() {
		session.add_cookies(&snapshot.cookies).await?;
		progress.cookies_applied = snapshot.cookies.len();
		debug!(target = "pw_state", count = snapshot.cookies.len(), "cookies applied");
	}
	progress.stage = RestoreStage::CookiesApplied;

	let origins = snapshot.unique_origins();
	if origins.len() < snapshot.origins.len() {
		warn!(
			target = "pw_state",
			duplicates = snapshot.origins.len() - origins.len(),
			"snapshot lists some origins more than once; keeping the last entry for each"
		);
	}

	for origin in origins {
		restore_origin(session, origin, progress).await?;
		progress.origins_completed += 1;
	}
	Ok(())
}

async fn restore_origin<S: Session + ?Sized>(session: &mut S, origin: &OriginState, progress: &mut RestoreProgress) -> Result<()> {
	progress.stage = RestoreStage::Navigating {
		origin: origin.origin.clone(),
	};
	let current = session.current_url().await?;
	if !current.starts_with(&origin.origin) {
		debug!(target = "pw_state", from = %current, to = %origin.origin, "navigating");
		session.navigate(&origin.origin).await?;
		progress.navigations += 1;
	}

	if origin.local_storage.is_empty() {
		return Ok(());
	}

	progress.stage = RestoreStage::Injecting {
		origin: origin.origin.clone(),
	};
	session.evaluate(&ScriptCall::set_local_storage(&origin.local_storage)).await?;
	progress.entries_written += origin.local_storage.len();
	debug!(target = "pw_state", origin = %origin.origin, entries = origin.local_storage.len(), "localStorage written");
	Ok(())
}
