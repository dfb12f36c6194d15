//! Reading and writing snapshot files.

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::fs::{Filesystem, LocalFs};
use crate::StorageState;

/// Persists [`StorageState`] snapshots as pretty-printed JSON.
#[derive(Debug, Clone, Default)]
pub struct Serializer<F = LocalFs> {
	fs: F,
}

impl Serializer<LocalFs> {
	/// Serializer for the local disk.
	pub fn local() -> Self {
		Self { fs: LocalFs }
	}
}

impl<F: Filesystem> Serializer<F> {
	pub fn new(fs: F) -> Self {
		Self { fs }
	}

	pub fn fs(&self) -> &F {
		&self.fs
	}

	/// Writes `snapshot` to `path`, creating parent directories as needed.
	///
	/// An existing file at `path` is overwritten.
	pub async fn save(&self, snapshot: &StorageState, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			self.fs.create_dir_all(parent).await.map_err(|source| Error::Io {
				path: parent.to_path_buf(),
				source,
			})?;
		}

		let mut content = serde_json::to_string_pretty(snapshot).map_err(Error::Encode)?;
		content.push('\n');

		self.fs.write_file(path, content.as_bytes()).await.map_err(|source| Error::Io {
			path: path.to_path_buf(),
			source,
		})?;

		debug!(
			target = "pw_state",
			path = %path.display(),
			cookies = snapshot.cookies.len(),
			origins = snapshot.origins.len(),
			"snapshot saved"
		);
		Ok(())
	}

	/// Reads and parses the snapshot at `path`.
	pub async fn load(&self, path: &Path) -> Result<StorageState> {
		let bytes = match self.fs.read_file(path).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::NotFound { path: path.to_path_buf() }),
			Err(source) => {
				return Err(Error::Io {
					path: path.to_path_buf(),
					source,
				});
			}
		};

		let snapshot: StorageState = serde_json::from_slice(&bytes).map_err(|source| Error::Parse {
			path: path.to_path_buf(),
			source,
		})?;

		debug!(
			target = "pw_state",
			path = %path.display(),
			cookies = snapshot.cookies.len(),
			origins = snapshot.origins.len(),
			"snapshot loaded"
		);
		Ok(snapshot)
	}
}
