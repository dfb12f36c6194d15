//! In-memory collaborators for testing without a browser.
//!
//! [`MemorySession`] behaves like a single tab: it keeps a cookie jar keyed by
//! name, domain and path, a URL, and localStorage partitioned by origin. It
//! understands the scripts in [`crate::script`] and records every call so
//! tests can assert on ordering.
//!
//! [`MemoryFs`] is a map of paths to bytes that requires parent directories
//! to exist before a file can be written, like a real disk.
//!
//! ```ignore
//! let mut session = MemorySession::new();
//! restore(&mut session, &snapshot).await?;
//! assert_eq!(session.local_storage_item("https://example.com", "theme"), Some("dark"));
//! ```

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::fs::Filesystem;
use crate::script::{GET_LOCAL_STORAGE_ITEM, SET_LOCAL_STORAGE, ScriptCall};
use crate::session::Session;
use crate::{Cookie, LocalStorageEntry};

/// A call made against a [`MemorySession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
	Cookies,
	AddCookies(usize),
	CurrentUrl,
	Navigate(String),
	/// Script evaluated, with the tab URL at the time of the call
	Evaluate { url: String },
	StorageOrigins,
	LocalStorage(String),
}

/// In-memory browser tab.
#[derive(Debug, Clone)]
pub struct MemorySession {
	active: bool,
	url: String,
	cookies: Vec<Cookie>,
	storage: IndexMap<String, IndexMap<String, String>>,
	calls: Vec<SessionCall>,
	fail_navigation: Option<String>,
	fail_scripts: bool,
}

impl Default for MemorySession {
	fn default() -> Self {
		Self::new()
	}
}

impl MemorySession {
	/// An active tab on `about:blank` with no state.
	pub fn new() -> Self {
		Self {
			active: true,
			url: "about:blank".to_string(),
			cookies: Vec::new(),
			storage: IndexMap::new(),
			calls: Vec::new(),
			fail_navigation: None,
			fail_scripts: false,
		}
	}

	/// A handle with no tab behind it.
	pub fn inactive() -> Self {
		Self {
			active: false,
			..Self::new()
		}
	}

	/// Starts the tab at `url`.
	pub fn with_url(mut self, url: impl Into<String>) -> Self {
		self.url = url.into();
		self
	}

	pub fn with_cookie(mut self, cookie: Cookie) -> Self {
		self.put_cookie(cookie);
		self
	}

	pub fn with_local_storage(mut self, origin: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.storage.entry(origin.into()).or_default().insert(name.into(), value.into());
		self
	}

	/// Makes navigation to URLs starting with `prefix` fail.
	pub fn fail_navigation_to(mut self, prefix: impl Into<String>) -> Self {
		self.fail_navigation = Some(prefix.into());
		self
	}

	/// Makes every script evaluation throw.
	pub fn fail_scripts(mut self) -> Self {
		self.fail_scripts = true;
		self
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn cookie_jar(&self) -> &[Cookie] {
		&self.cookies
	}

	pub fn local_storage_item(&self, origin: &str, name: &str) -> Option<&str> {
		self.storage.get(origin)?.get(name).map(String::as_str)
	}

	pub fn calls(&self) -> &[SessionCall] {
		&self.calls
	}

	pub fn clear_calls(&mut self) {
		self.calls.clear();
	}

	/// URLs navigated to, in order.
	pub fn navigations(&self) -> Vec<&str> {
		self.calls
			.iter()
			.filter_map(|call| match call {
				SessionCall::Navigate(url) => Some(url.as_str()),
				_ => None,
			})
			.collect()
	}

	/// Tab URLs at the time of each script evaluation.
	pub fn evaluations(&self) -> Vec<&str> {
		self.calls
			.iter()
			.filter_map(|call| match call {
				SessionCall::Evaluate { url } => Some(url.as_str()),
				_ => None,
			})
			.collect()
	}

	/// Number of calls that changed cookies, location or storage.
	pub fn mutation_count(&self) -> usize {
		self.calls
			.iter()
			.filter(|call| matches!(call, SessionCall::AddCookies(_) | SessionCall::Navigate(_) | SessionCall::Evaluate { .. }))
			.count()
	}

	fn put_cookie(&mut self, cookie: Cookie) {
		match self.cookies.iter_mut().find(|existing| existing.same_slot(&cookie)) {
			Some(existing) => *existing = cookie,
			None => self.cookies.push(cookie),
		}
	}

	fn current_origin(&self) -> Option<String> {
		let url = Url::parse(&self.url).ok()?;
		let origin = url.origin();
		origin.is_tuple().then(|| origin.ascii_serialization())
	}

	fn set_local_storage(&mut self, args: &[Value]) -> Result<Value> {
		let origin = self
			.current_origin()
			.ok_or_else(|| Error::ScriptEvaluation(format!("SecurityError: localStorage is not available on {}", self.url)))?;
		let entries = args
			.first()
			.cloned()
			.map(serde_json::from_value::<Vec<LocalStorageEntry>>)
			.transpose()
			.map_err(|e| Error::ScriptEvaluation(format!("TypeError: {e}")))?
			.unwrap_or_default();

		let storage = self.storage.entry(origin).or_default();
		for entry in &entries {
			storage.insert(entry.name.clone(), entry.value.clone());
		}
		Ok(Value::from(entries.len()))
	}

	fn get_local_storage_item(&self, args: &[Value]) -> Result<Value> {
		let origin = self
			.current_origin()
			.ok_or_else(|| Error::ScriptEvaluation(format!("SecurityError: localStorage is not available on {}", self.url)))?;
		let name = args.first().and_then(Value::as_str).unwrap_or_default();
		Ok(self
			.storage
			.get(&origin)
			.and_then(|items| items.get(name))
			.map_or(Value::Null, |value| Value::String(value.clone())))
	}
}

#[async_trait]
impl Session for MemorySession {
	fn is_active(&self) -> bool {
		self.active
	}

	async fn cookies(&mut self) -> Result<Vec<Cookie>> {
		self.calls.push(SessionCall::Cookies);
		Ok(self.cookies.clone())
	}

	async fn add_cookies(&mut self, cookies: &[Cookie]) -> Result<()> {
		self.calls.push(SessionCall::AddCookies(cookies.len()));
		for cookie in cookies {
			self.put_cookie(cookie.clone());
		}
		Ok(())
	}

	async fn current_url(&mut self) -> Result<String> {
		self.calls.push(SessionCall::CurrentUrl);
		Ok(self.url.clone())
	}

	async fn navigate(&mut self, url: &str) -> Result<()> {
		self.calls.push(SessionCall::Navigate(url.to_string()));
		if self.fail_navigation.as_deref().is_some_and(|prefix| url.starts_with(prefix)) {
			return Err(Error::Navigation {
				url: url.to_string(),
				message: "net::ERR_CONNECTION_REFUSED".into(),
			});
		}
		let parsed = Url::parse(url).map_err(|e| Error::Navigation {
			url: url.to_string(),
			message: e.to_string(),
		})?;
		self.url = parsed.to_string();
		Ok(())
	}

	async fn evaluate(&mut self, call: &ScriptCall) -> Result<Value> {
		self.calls.push(SessionCall::Evaluate { url: self.url.clone() });
		if self.fail_scripts {
			return Err(Error::ScriptEvaluation("Error: script blocked".into()));
		}
		match call.function.as_ref() {
			SET_LOCAL_STORAGE => self.set_local_storage(&call.args),
			GET_LOCAL_STORAGE_ITEM => self.get_local_storage_item(&call.args),
			other => Err(Error::ScriptEvaluation(format!("unsupported script: {other}"))),
		}
	}

	async fn storage_origins(&mut self) -> Result<Vec<String>> {
		self.calls.push(SessionCall::StorageOrigins);
		Ok(self
			.storage
			.iter()
			.filter(|(_, items)| !items.is_empty())
			.map(|(origin, _)| origin.clone())
			.collect())
	}

	async fn local_storage(&mut self, origin: &str) -> Result<Vec<LocalStorageEntry>> {
		self.calls.push(SessionCall::LocalStorage(origin.to_string()));
		Ok(self
			.storage
			.get(origin)
			.map(|items| items.iter().map(|(name, value)| LocalStorageEntry::new(name.clone(), value.clone())).collect())
			.unwrap_or_default())
	}
}

#[derive(Debug, Default)]
struct FsState {
	files: HashMap<PathBuf, Vec<u8>>,
	dirs: HashSet<PathBuf>,
}

/// In-memory [`Filesystem`]. The root directory always exists.
#[derive(Debug, Default)]
pub struct MemoryFs {
	state: Mutex<FsState>,
}

impl MemoryFs {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `contents` at `path`, creating its parents.
	pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
		let path = path.as_ref();
		let mut state = self.state.lock();
		for ancestor in path.ancestors().skip(1) {
			state.dirs.insert(ancestor.to_path_buf());
		}
		state.files.insert(path.to_path_buf(), contents.into());
	}

	pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
		self.state.lock().files.get(path.as_ref()).cloned()
	}

	pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
		let path = path.as_ref();
		path.parent().is_none() || self.state.lock().dirs.contains(path)
	}
}

#[async_trait]
impl Filesystem for MemoryFs {
	async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
		self.contents(path)
			.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} does not exist", path.display())))
	}

	async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			if !self.is_dir(parent) {
				return Err(io::Error::new(io::ErrorKind::NotFound, format!("{} does not exist", parent.display())));
			}
		}
		self.state.lock().files.insert(path.to_path_buf(), contents.to_vec());
		Ok(())
	}

	async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
		let mut state = self.state.lock();
		for ancestor in path.ancestors() {
			state.dirs.insert(ancestor.to_path_buf());
		}
		Ok(())
	}
}
