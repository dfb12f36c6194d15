//! Finding and attaching to a browser tab.
//!
//! `--endpoint` is normally the CDP HTTP endpoint of a Chromium started with
//! `--remote-debugging-port`. Its `/json/list` is queried and the first page
//! target is attached to. A `ws://` or `wss://` endpoint is taken to be a
//! page's debugger URL and is connected to directly.

use std::time::Duration;

use anyhow::Context;
use pw_state::cdp::CdpSession;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// How to reach the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
	pub endpoint: String,
	pub timeout: Duration,
}

impl ConnectConfig {
	pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
		Self {
			endpoint: endpoint.into(),
			timeout,
		}
	}

	pub fn from_cli(cli: &Cli) -> Self {
		Self::new(cli.endpoint.clone(), Duration::from_millis(cli.timeout))
	}

	fn is_websocket(&self) -> bool {
		self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")
	}
}

/// `/json/list` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub url: String,
	#[serde(default)]
	pub web_socket_debugger_url: Option<String>,
}

/// Resolves the target list URL for an HTTP endpoint.
pub fn list_url(endpoint: &str) -> anyhow::Result<Url> {
	let base = Url::parse(endpoint).with_context(|| format!("invalid endpoint URL {endpoint:?}"))?;
	if !matches!(base.scheme(), "http" | "https") {
		anyhow::bail!("endpoint must be http(s) or ws(s), got {}", base.scheme());
	}
	let list = format!("{}/json/list", base.as_str().trim_end_matches('/'));
	Url::parse(&list).with_context(|| format!("invalid endpoint URL {endpoint:?}"))
}

/// Picks the first attachable page, skipping workers, extensions and the like.
pub fn first_page_target(targets: Vec<TargetInfo>) -> Option<TargetInfo> {
	targets
		.into_iter()
		.find(|target| target.kind == "page" && target.web_socket_debugger_url.is_some())
}

/// Lists the endpoint's targets and returns the first page.
pub async fn discover_page(config: &ConnectConfig) -> Result<TargetInfo> {
	let discovery = |source: anyhow::Error| CliError::Discovery {
		endpoint: config.endpoint.clone(),
		source,
	};

	let url = list_url(&config.endpoint).map_err(discovery)?;
	let client = reqwest::Client::builder()
		.timeout(config.timeout)
		.build()
		.context("failed to create HTTP client")
		.map_err(discovery)?;

	let response = client
		.get(url.clone())
		.send()
		.await
		.with_context(|| format!("GET {url}"))
		.map_err(discovery)?;
	if !response.status().is_success() {
		return Err(discovery(anyhow::anyhow!("GET {url}: unexpected status {}", response.status())));
	}

	let targets: Vec<TargetInfo> = response
		.json()
		.await
		.context("failed to parse target list")
		.map_err(discovery)?;
	debug!(target = "pw_state_cli", count = targets.len(), "listed targets");

	first_page_target(targets).ok_or_else(|| CliError::NoPageTarget {
		endpoint: config.endpoint.clone(),
	})
}

/// Attaches to the tab the config points at.
pub async fn open_session(config: &ConnectConfig) -> Result<CdpSession> {
	let ws_url = if config.is_websocket() {
		config.endpoint.clone()
	} else {
		let target = discover_page(config).await?;
		info!(target = "pw_state_cli", id = %target.id, url = %target.url, title = %target.title, "attaching to page");
		target.web_socket_debugger_url.ok_or_else(|| CliError::NoPageTarget {
			endpoint: config.endpoint.clone(),
		})?
	};

	Ok(CdpSession::connect(&ws_url, config.timeout).await?)
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use tokio::io::{AsyncReadExt, AsyncWriteExt};
	use tokio::net::TcpListener;

	use super::*;

	fn targets(value: serde_json::Value) -> Vec<TargetInfo> {
		serde_json::from_value(value).unwrap()
	}

	/// Serves one HTTP response with `body` and returns the endpoint URL.
	async fn serve_once(body: String) -> String {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			let (mut stream, _) = listener.accept().await.unwrap();
			let mut buf = [0u8; 4096];
			let _ = stream.read(&mut buf).await;
			let response = format!(
				"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
				body.len()
			);
			stream.write_all(response.as_bytes()).await.unwrap();
			stream.shutdown().await.unwrap();
		});
		format!("http://{addr}")
	}

	#[test]
	fn list_url_appends_path() {
		assert_eq!(list_url("http://127.0.0.1:9222").unwrap().as_str(), "http://127.0.0.1:9222/json/list");
		assert_eq!(list_url("http://localhost:9222/").unwrap().as_str(), "http://localhost:9222/json/list");
		assert_eq!(list_url("https://browser.internal/cdp").unwrap().as_str(), "https://browser.internal/cdp/json/list");
	}

	#[test]
	fn list_url_rejects_garbage() {
		assert!(list_url("not a url").is_err());
		assert!(list_url("ftp://host").is_err());
	}

	#[test]
	fn first_page_skips_other_target_kinds() {
		let list = targets(json!([
			{"id": "sw", "type": "service_worker", "url": "https://a.test/sw.js", "webSocketDebuggerUrl": "ws://x/sw"},
			{"id": "attached", "type": "page", "url": "https://a.test/"},
			{"id": "p1", "type": "page", "title": "A", "url": "https://a.test/", "webSocketDebuggerUrl": "ws://x/p1"},
			{"id": "p2", "type": "page", "url": "https://b.test/", "webSocketDebuggerUrl": "ws://x/p2"}
		]));

		let page = first_page_target(list).unwrap();
		assert_eq!(page.id, "p1");
		assert_eq!(page.web_socket_debugger_url.as_deref(), Some("ws://x/p1"));
	}

	#[test]
	fn no_page_in_list() {
		assert!(first_page_target(targets(json!([{"id": "bg", "type": "background_page"}]))).is_none());
		assert!(first_page_target(Vec::new()).is_none());
	}

	#[test]
	fn websocket_endpoints_skip_discovery() {
		assert!(ConnectConfig::new("ws://127.0.0.1:9222/devtools/page/1", Duration::from_secs(1)).is_websocket());
		assert!(!ConnectConfig::new("http://127.0.0.1:9222", Duration::from_secs(1)).is_websocket());
	}

	#[tokio::test]
	async fn discovers_first_page_over_http() {
		let body = json!([
			{"id": "p1", "type": "page", "url": "https://a.test/", "webSocketDebuggerUrl": "ws://127.0.0.1:9/devtools/page/p1"}
		])
		.to_string();
		let endpoint = serve_once(body).await;

		let page = discover_page(&ConnectConfig::new(endpoint, Duration::from_secs(5))).await.unwrap();
		assert_eq!(page.id, "p1");
	}

	#[tokio::test]
	async fn empty_target_list_is_no_page() {
		let endpoint = serve_once("[]".into()).await;

		let err = discover_page(&ConnectConfig::new(endpoint, Duration::from_secs(5))).await.unwrap_err();
		assert!(matches!(err, CliError::NoPageTarget { .. }));
	}

	#[tokio::test]
	async fn unreachable_endpoint_is_discovery_error() {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let endpoint = format!("http://{}", listener.local_addr().unwrap());
		drop(listener);

		let err = discover_page(&ConnectConfig::new(endpoint, Duration::from_secs(2))).await.unwrap_err();
		assert!(matches!(err, CliError::Discovery { .. }));
	}
}
