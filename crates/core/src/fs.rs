//! Filesystem collaborator used by the [`Serializer`](crate::Serializer).

use std::io;
use std::path::Path;

use async_trait::async_trait;

/// File operations needed to persist snapshots.
#[async_trait]
pub trait Filesystem: Send + Sync {
	async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

	/// Writes `contents`, truncating any existing file.
	async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

	/// Creates `path` and all missing parents; succeeds if it already exists.
	async fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// The local disk, via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl Filesystem for LocalFs {
	async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
		tokio::fs::read(path).await
	}

	async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
		tokio::fs::write(path, contents).await
	}

	async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
		tokio::fs::create_dir_all(path).await
	}
}
