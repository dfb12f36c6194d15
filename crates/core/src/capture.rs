//! Reading session state out of a live tab.

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::fs::Filesystem;
use crate::serializer::Serializer;
use crate::session::Session;
use crate::{OriginState, StorageState};

/// Captures the cookie jar and localStorage of every origin with data.
///
/// Read-only: the tab is not navigated and nothing is written to it.
/// Origins whose storage turns out to be empty are left out.
pub async fn capture<S: Session + ?Sized>(session: &mut S) -> Result<StorageState> {
	if !session.is_active() {
		return Err(Error::SessionUnavailable);
	}

	let cookies = session.cookies().await?;

	let mut origins = Vec::new();
	for origin in session.storage_origins().await? {
		let entries = session.local_storage(&origin).await?;
		if entries.is_empty() {
			continue;
		}
		debug!(target = "pw_state", origin = %origin, entries = entries.len(), "captured localStorage");
		origins.push(OriginState::new(origin, entries));
	}

	debug!(target = "pw_state", cookies = cookies.len(), origins = origins.len(), "captured session state");
	Ok(StorageState::new(cookies, origins))
}

/// Captures the session and writes the snapshot to `path`.
pub async fn capture_to_file<S, F>(session: &mut S, serializer: &Serializer<F>, path: &Path) -> Result<StorageState>
where
	S: Session + ?Sized,
	F: Filesystem,
{
	let snapshot = capture(session).await?;
	serializer.save(&snapshot, path).await?;
	Ok(snapshot)
}
