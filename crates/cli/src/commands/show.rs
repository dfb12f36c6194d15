use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use pw_state::{Serializer, StorageState};
use serde::Serialize;

use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowData {
	pub path: PathBuf,
	pub cookie_count: usize,
	pub cookies: Vec<CookieSummary>,
	pub origin_count: usize,
	pub origins: Vec<OriginSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieSummary {
	pub name: String,
	pub domain: String,
	pub path: String,
	pub expires: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginSummary {
	pub origin: String,
	pub keys: Vec<String>,
}

impl ShowData {
	fn new(path: &Path, state: &StorageState, now: i64) -> Self {
		let cookies = state
			.cookies
			.iter()
			.map(|cookie| CookieSummary {
				name: cookie.name.clone(),
				domain: cookie.domain.clone(),
				path: cookie.path.clone(),
				expires: format_expiry(cookie.expires, now),
			})
			.collect();
		let origins = state
			.origins
			.iter()
			.map(|origin| OriginSummary {
				origin: origin.origin.clone(),
				keys: origin.local_storage.iter().map(|entry| entry.name.clone()).collect(),
			})
			.collect();

		Self {
			path: path.to_path_buf(),
			cookie_count: state.cookies.len(),
			cookies,
			origin_count: state.origins.len(),
			origins,
		}
	}
}

impl fmt::Display for ShowData {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{}", self.path.display())?;
		writeln!(f, "cookies ({}):", self.cookie_count)?;
		for cookie in &self.cookies {
			writeln!(f, "  {} {}{} [{}]", cookie.name, cookie.domain, cookie.path, cookie.expires)?;
		}
		write!(f, "origins ({}):", self.origin_count)?;
		for origin in &self.origins {
			write!(f, "\n  {} ({} keys)", origin.origin, origin.keys.len())?;
		}
		Ok(())
	}
}

/// Summarizes the snapshot at `path`. No browser is needed.
pub async fn execute(path: &Path) -> Result<ShowData> {
	let state = Serializer::local().load(path).await.map_err(|source| CliError::Show {
		path: path.to_path_buf(),
		source,
	})?;
	Ok(ShowData::new(path, &state, unix_now()))
}

fn unix_now() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs() as i64)
		.unwrap_or(0)
}

/// Renders a cookie expiry relative to `now` (unix seconds).
pub fn format_expiry(expires: Option<f64>, now: i64) -> String {
	let ts = match expires {
		None => return "session".into(),
		Some(ts) if ts < 0.0 => return "session".into(),
		Some(ts) => ts as i64,
	};

	if ts < now {
		return "expired".into();
	}

	match ts - now {
		d if d < 3600 => format!("{}m", d / 60),
		d if d < 86400 => format!("{}h", d / 3600),
		d => format!("{}d", d / 86400),
	}
}
