//! Cookie and storage state types for session snapshots.
//!
//! These types represent browser cookies and localStorage data that can be
//! saved and restored to persist authentication across sessions.

use serde::{Deserialize, Serialize};

/// A browser cookie.
///
/// `sameSite` is kept as the raw string reported by the browser; the snapshot
/// only passes it through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	/// Cookie name
	pub name: String,

	/// Cookie value
	pub value: String,

	/// Domain for the cookie
	pub domain: String,

	/// Path for the cookie
	pub path: String,

	/// Unix timestamp in seconds (-1 means session cookie)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,

	/// Whether the cookie is HTTP-only
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub http_only: Option<bool>,

	/// Whether the cookie requires HTTPS
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secure: Option<bool>,

	/// SameSite attribute (`Strict`, `Lax` or `None`)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub same_site: Option<String>,
}

impl Cookie {
	/// Creates a new cookie with required fields.
	pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>, path: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			domain: domain.into(),
			path: path.into(),
			expires: None,
			http_only: None,
			secure: None,
			same_site: None,
		}
	}

	/// Sets the expiration timestamp.
	pub fn expires(mut self, expires: f64) -> Self {
		self.expires = Some(expires);
		self
	}

	/// Sets whether the cookie is HTTP-only.
	pub fn http_only(mut self, http_only: bool) -> Self {
		self.http_only = Some(http_only);
		self
	}

	/// Sets whether the cookie requires HTTPS.
	pub fn secure(mut self, secure: bool) -> Self {
		self.secure = Some(secure);
		self
	}

	/// Sets the SameSite attribute.
	pub fn same_site(mut self, same_site: impl Into<String>) -> Self {
		self.same_site = Some(same_site.into());
		self
	}

	/// Returns true if the cookie lives only as long as the browser session.
	pub fn is_session(&self) -> bool {
		self.expires.is_none_or(|ts| ts < 0.0)
	}

	/// Returns true if `other` occupies the same cookie jar slot.
	pub fn same_slot(&self, other: &Cookie) -> bool {
		self.name == other.name && self.domain == other.domain && self.path == other.path
	}
}

/// A localStorage entry within an origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalStorageEntry {
	/// Storage key
	pub name: String,
	/// Storage value
	pub value: String,
}

impl LocalStorageEntry {
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
		}
	}
}

/// Storage state for a single origin.
///
/// Entries are applied in order, so a later entry with the same name
/// overwrites an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
	/// The origin URL (e.g. `https://example.com`)
	pub origin: String,
	/// localStorage entries for this origin
	#[serde(default)]
	pub local_storage: Vec<LocalStorageEntry>,
}

impl OriginState {
	pub fn new(origin: impl Into<String>, local_storage: Vec<LocalStorageEntry>) -> Self {
		Self {
			origin: origin.into(),
			local_storage,
		}
	}
}

/// Complete browser storage state.
///
/// Contains all cookies and localStorage data that can be saved and restored
/// to persist authentication across browser sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
	/// All cookies in the browser context, in capture order
	pub cookies: Vec<Cookie>,
	/// localStorage data per origin
	pub origins: Vec<OriginState>,
}

impl StorageState {
	pub fn new(cookies: Vec<Cookie>, origins: Vec<OriginState>) -> Self {
		Self { cookies, origins }
	}

	/// Creates a storage state with cookies only.
	pub fn with_cookies(cookies: Vec<Cookie>) -> Self {
		Self {
			cookies,
			origins: Vec::new(),
		}
	}

	/// Returns true if the snapshot holds neither cookies nor origins.
	pub fn is_empty(&self) -> bool {
		self.cookies.is_empty() && self.origins.is_empty()
	}

	/// Origins with duplicates collapsed, last occurrence wins.
	///
	/// A repeated origin keeps the position of its last occurrence; earlier
	/// occurrences are dropped entirely rather than merged.
	pub fn unique_origins(&self) -> Vec<&OriginState> {
		self.origins
			.iter()
			.enumerate()
			.filter(|(idx, origin)| !self.origins[idx + 1..].iter().any(|later| later.origin == origin.origin))
			.map(|(_, origin)| origin)
			.collect()
	}

	/// Total number of localStorage entries across all origins.
	pub fn entry_count(&self) -> usize {
		self.origins.iter().map(|o| o.local_storage.len()).sum()
	}
}
