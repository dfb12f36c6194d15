//! The browser-side collaborator.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::script::ScriptCall;
use crate::{Cookie, LocalStorageEntry};

/// A live browser tab that state can be read from and written to.
///
/// Capture and restore take the session as `&mut`, so one operation has the
/// tab to itself until it finishes. Anything else driving the same tab must
/// be serialized by the caller.
///
/// Implementations report failures with the matching [`Error`](crate::Error)
/// variant: [`Navigation`](crate::Error::Navigation) from [`navigate`](Self::navigate),
/// [`ScriptEvaluation`](crate::Error::ScriptEvaluation) from
/// [`evaluate`](Self::evaluate) and [`Session`](crate::Error::Session) for
/// the rest.
#[async_trait]
pub trait Session: Send {
	/// Returns false if there is no tab behind this handle.
	fn is_active(&self) -> bool;

	/// Returns every cookie in the jar.
	async fn cookies(&mut self) -> Result<Vec<Cookie>>;

	/// Adds `cookies` to the jar in one batch, replacing cookies with the same
	/// name, domain and path.
	async fn add_cookies(&mut self, cookies: &[Cookie]) -> Result<()>;

	/// Returns the tab's current URL.
	async fn current_url(&mut self) -> Result<String>;

	/// Navigates the tab to `url`, resolving once the page has loaded.
	async fn navigate(&mut self, url: &str) -> Result<()>;

	/// Calls a function in the page's context and returns its result.
	async fn evaluate(&mut self, call: &ScriptCall) -> Result<Value>;

	/// Returns the origins known to hold storage data.
	async fn storage_origins(&mut self) -> Result<Vec<String>>;

	/// Returns the localStorage entries of `origin` without navigating.
	async fn local_storage(&mut self, origin: &str) -> Result<Vec<LocalStorageEntry>>;
}
