//! Connection round trips against a local WebSocket server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pw_state_runtime::{Connection, Error};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

#[tokio::test]
async fn connection_round_trip_over_websocket() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		let (mut ws_tx, mut ws_rx) = ws.split();

		let incoming = ws_rx.next().await.unwrap().unwrap();
		let request: Value = serde_json::from_str(incoming.to_text().unwrap()).unwrap();
		assert_eq!(request["method"], "Page.navigate");
		assert_eq!(request["params"]["url"], "https://example.com");

		ws_tx
			.send(Message::Text(json!({"method": "Page.loadEventFired", "params": {"timestamp": 1.0}}).to_string().into()))
			.await
			.unwrap();
		ws_tx
			.send(Message::Text(json!({"id": request["id"], "result": {"frameId": "F1"}}).to_string().into()))
			.await
			.unwrap();
	});

	let connection = Connection::connect(&format!("ws://{addr}"), Duration::from_secs(5)).await.unwrap();
	let mut events = connection.subscribe();

	let result = connection.send("Page.navigate", json!({"url": "https://example.com"})).await.unwrap();
	assert_eq!(result["frameId"], "F1");

	let event = connection.wait_for_event(&mut events, "Page.loadEventFired").await.unwrap();
	assert_eq!(event.params["timestamp"], 1.0);

	server.await.unwrap();
}

#[tokio::test]
async fn malformed_frame_does_not_drop_connection() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

		let incoming = ws.next().await.unwrap().unwrap();
		let request: Value = serde_json::from_str(incoming.to_text().unwrap()).unwrap();

		ws.send(Message::Text("{not json".to_string().into())).await.unwrap();
		ws.send(Message::Text(json!({"id": request["id"], "result": {"cookies": []}}).to_string().into()))
			.await
			.unwrap();
	});

	let connection = Connection::connect(&format!("ws://{addr}"), Duration::from_secs(5)).await.unwrap();

	let result = connection.send("Network.getAllCookies", json!({})).await.unwrap();
	assert_eq!(result["cookies"], json!([]));

	server.await.unwrap();
}

#[tokio::test]
async fn connect_to_closed_port_fails() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let err = Connection::connect(&format!("ws://{addr}"), Duration::from_secs(1)).await.err().unwrap();
	assert!(matches!(err, Error::ConnectionFailed(_)));
}
