//! [`Session`] over the Chrome DevTools Protocol.
//!
//! Connects to a page target's `webSocketDebuggerUrl` and maps the session
//! operations onto CDP commands:
//!
//! | Operation | CDP |
//! |---|---|
//! | cookies | `Network.getAllCookies` |
//! | add_cookies | `Network.setCookies` |
//! | current_url | `Page.getNavigationHistory` |
//! | navigate | `Page.navigate` + `Page.loadEventFired` |
//! | evaluate | `Runtime.evaluate` (global object) + `Runtime.callFunctionOn` |
//! | storage_origins | `Page.getFrameTree` |
//! | local_storage | `DOMStorage.getDOMStorageItems` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pw_state_runtime::Connection;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::{Error, Result};
use crate::script::ScriptCall;
use crate::session::Session;
use crate::{Cookie, LocalStorageEntry};

/// A Chromium tab driven over CDP.
pub struct CdpSession {
	connection: Arc<Connection>,
}

impl CdpSession {
	/// Connects to a page target and enables the domains the session needs.
	pub async fn connect(ws_url: &str, timeout: Duration) -> Result<Self> {
		let connection = Connection::connect(ws_url, timeout).await?;
		Self::attach(connection).await
	}

	/// Wraps an existing connection to a page target.
	pub async fn attach(connection: Arc<Connection>) -> Result<Self> {
		for domain in ["Page", "DOMStorage"] {
			connection.send(&format!("{domain}.enable"), json!({})).await?;
		}
		Ok(Self { connection })
	}

	pub fn connection(&self) -> &Arc<Connection> {
		&self.connection
	}
}

#[async_trait]
impl Session for CdpSession {
	fn is_active(&self) -> bool {
		!self.connection.is_closed()
	}

	async fn cookies(&mut self) -> Result<Vec<Cookie>> {
		let result = self.connection.send("Network.getAllCookies", json!({})).await?;
		let response: CookiesResponse = serde_json::from_value(result).map_err(|e| Error::Session(format!("unexpected cookie list: {e}")))?;
		Ok(response.cookies.into_iter().map(Cookie::from).collect())
	}

	async fn add_cookies(&mut self, cookies: &[Cookie]) -> Result<()> {
		let params: Vec<Value> = cookies.iter().map(cookie_param).collect();
		self.connection
			.send("Network.setCookies", json!({ "cookies": params }))
			.await
			.map_err(|e| Error::Session(format!("failed to set cookies: {e}")))?;
		Ok(())
	}

	async fn current_url(&mut self) -> Result<String> {
		let history = self.connection.send("Page.getNavigationHistory", json!({})).await?;
		current_history_url(&history).ok_or_else(|| Error::Session("navigation history has no current entry".into()))
	}

	async fn navigate(&mut self, url: &str) -> Result<()> {
		let navigation_error = |message: String| Error::Navigation { url: url.to_string(), message };

		let mut events = self.connection.subscribe();
		let result = self
			.connection
			.send("Page.navigate", json!({ "url": url }))
			.await
			.map_err(|e| navigation_error(e.to_string()))?;

		if let Some(text) = result.get("errorText").and_then(Value::as_str).filter(|t| !t.is_empty()) {
			return Err(navigation_error(text.to_string()));
		}

		// Same-document navigations carry no loader and fire no load event.
		if result.get("loaderId").is_none() {
			return Ok(());
		}

		self.connection
			.wait_for_event(&mut events, "Page.loadEventFired")
			.await
			.map_err(|e| navigation_error(e.to_string()))?;
		debug!(target = "pw_state", url, "navigation settled");
		Ok(())
	}

	async fn evaluate(&mut self, call: &ScriptCall) -> Result<Value> {
		let script_error = |e: pw_state_runtime::Error| Error::ScriptEvaluation(e.to_string());

		let global = self
			.connection
			.send("Runtime.evaluate", json!({ "expression": "globalThis" }))
			.await
			.map_err(script_error)?;
		let object_id = global["result"]["objectId"]
			.as_str()
			.ok_or_else(|| Error::ScriptEvaluation("page has no global object".into()))?;

		let arguments: Vec<Value> = call.args.iter().map(|arg| json!({ "value": arg })).collect();
		let response = self
			.connection
			.send(
				"Runtime.callFunctionOn",
				json!({
					"functionDeclaration": call.function,
					"objectId": object_id,
					"arguments": arguments,
					"returnByValue": true,
					"awaitPromise": true,
				}),
			)
			.await
			.map_err(script_error)?;

		if let Some(details) = response.get("exceptionDetails") {
			return Err(Error::ScriptEvaluation(describe_exception(details)));
		}
		Ok(response["result"].get("value").cloned().unwrap_or(Value::Null))
	}

	async fn storage_origins(&mut self) -> Result<Vec<String>> {
		let tree = self.connection.send("Page.getFrameTree", json!({})).await?;
		Ok(frame_tree_origins(&tree["frameTree"]))
	}

	async fn local_storage(&mut self, origin: &str) -> Result<Vec<LocalStorageEntry>> {
		let result = self
			.connection
			.send(
				"DOMStorage.getDOMStorageItems",
				json!({ "storageId": { "securityOrigin": origin, "isLocalStorage": true } }),
			)
			.await?;
		let items: StorageItems = serde_json::from_value(result).map_err(|e| Error::Session(format!("unexpected storage items for {origin}: {e}")))?;
		Ok(items.entries.into_iter().map(|[name, value]| LocalStorageEntry { name, value }).collect())
	}
}

/// `Network.Cookie` subset.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdpCookie {
	name: String,
	value: String,
	domain: String,
	path: String,
	#[serde(default)]
	expires: Option<f64>,
	#[serde(default)]
	http_only: Option<bool>,
	#[serde(default)]
	secure: Option<bool>,
	#[serde(default)]
	session: bool,
	#[serde(default)]
	same_site: Option<String>,
}

impl From<CdpCookie> for Cookie {
	fn from(cookie: CdpCookie) -> Self {
		Cookie {
			name: cookie.name,
			value: cookie.value,
			domain: cookie.domain,
			path: cookie.path,
			expires: if cookie.session { Some(-1.0) } else { cookie.expires },
			http_only: cookie.http_only,
			secure: cookie.secure,
			same_site: cookie.same_site,
		}
	}
}

#[derive(Debug, Deserialize)]
struct CookiesResponse {
	cookies: Vec<CdpCookie>,
}

#[derive(Debug, Deserialize)]
struct StorageItems {
	entries: Vec<[String; 2]>,
}

/// Builds a `Network.CookieParam`. Session cookies go without `expires`.
fn cookie_param(cookie: &Cookie) -> Value {
	let mut param = Map::new();
	param.insert("name".into(), json!(cookie.name));
	param.insert("value".into(), json!(cookie.value));
	param.insert("domain".into(), json!(cookie.domain));
	param.insert("path".into(), json!(cookie.path));
	if let Some(expires) = cookie.expires.filter(|ts| *ts >= 0.0) {
		param.insert("expires".into(), json!(expires));
	}
	if let Some(http_only) = cookie.http_only {
		param.insert("httpOnly".into(), json!(http_only));
	}
	if let Some(secure) = cookie.secure {
		param.insert("secure".into(), json!(secure));
	}
	if let Some(same_site) = &cookie.same_site {
		param.insert("sameSite".into(), json!(same_site));
	}
	Value::Object(param)
}

fn current_history_url(history: &Value) -> Option<String> {
	let index = history["currentIndex"].as_u64()? as usize;
	history["entries"].get(index)?["url"].as_str().map(str::to_string)
}

/// Collects the security origins of a frame tree, skipping opaque origins.
fn frame_tree_origins(tree: &Value) -> Vec<String> {
	let mut origins = Vec::new();
	let mut stack = vec![tree];
	while let Some(node) = stack.pop() {
		if let Some(origin) = node["frame"]["securityOrigin"].as_str() {
			if origin.contains("://") && !origins.iter().any(|o| o == origin) {
				origins.push(origin.to_string());
			}
		}
		if let Some(children) = node["childFrames"].as_array() {
			stack.extend(children.iter().rev());
		}
	}
	origins
}

fn describe_exception(details: &Value) -> String {
	details["exception"]["description"]
		.as_str()
		.or_else(|| details["text"].as_str())
		.unwrap_or("uncaught exception")
		.to_string()
}
