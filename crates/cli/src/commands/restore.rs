use std::fmt;
use std::path::{Path, PathBuf};

use pw_state::{RestoreProgress, Serializer, restore};
use serde::Serialize;

use crate::connect::{ConnectConfig, open_session};
use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreData {
	pub path: PathBuf,
	pub cookies_applied: usize,
	pub origins_restored: usize,
	pub navigations: usize,
	pub entries_written: usize,
}

impl RestoreData {
	fn new(path: &Path, progress: &RestoreProgress) -> Self {
		Self {
			path: path.to_path_buf(),
			cookies_applied: progress.cookies_applied,
			origins_restored: progress.origins_completed,
			navigations: progress.navigations,
			entries_written: progress.entries_written,
		}
	}
}

impl fmt::Display for RestoreData {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Restored {} cookies and {} localStorage entries across {} origins from {}",
			self.cookies_applied,
			self.entries_written,
			self.origins_restored,
			self.path.display()
		)
	}
}

/// Applies the snapshot at `path` to the attached tab.
///
/// The file is parsed before connecting, so a bad file never reaches the
/// browser.
pub async fn execute(config: &ConnectConfig, path: &Path) -> Result<RestoreData> {
	let restore_error = |source| CliError::Restore {
		path: path.to_path_buf(),
		source,
	};

	let snapshot = Serializer::local().load(path).await.map_err(restore_error)?;
	let mut session = open_session(config).await.map_err(|e| e.for_snapshot(path))?;
	let progress = restore(&mut session, &snapshot).await.map_err(restore_error)?;

	Ok(RestoreData::new(path, &progress))
}
