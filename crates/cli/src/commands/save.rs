use std::fmt;
use std::path::{Path, PathBuf};

use pw_state::{Serializer, capture_to_file};
use serde::Serialize;
use tracing::info;

use crate::connect::{ConnectConfig, open_session};
use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
	pub path: PathBuf,
	pub cookies: usize,
	pub origins: usize,
	pub entries: usize,
}

impl fmt::Display for SaveData {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Saved {} cookies and {} localStorage entries across {} origins to {}",
			self.cookies,
			self.entries,
			self.origins,
			self.path.display()
		)
	}
}

/// Captures the attached tab into `path`.
pub async fn execute(config: &ConnectConfig, path: &Path) -> Result<SaveData> {
	let mut session = open_session(config).await.map_err(|e| e.for_snapshot(path))?;

	let snapshot = capture_to_file(&mut session, &Serializer::local(), path)
		.await
		.map_err(|source| CliError::Save {
			path: path.to_path_buf(),
			source,
		})?;

	info!(target = "pw_state_cli", path = %path.display(), "session state saved");
	Ok(SaveData {
		path: path.to_path_buf(),
		cookies: snapshot.cookies.len(),
		origins: snapshot.origins.len(),
		entries: snapshot.entry_count(),
	})
}
