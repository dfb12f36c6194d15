//! Capturing state from an in-memory tab.

use pw_state::testing::{MemoryFs, MemorySession, SessionCall};
use pw_state::{Cookie, Error, LocalStorageEntry, Serializer, capture, capture_to_file};

#[tokio::test]
async fn captures_cookies_and_non_empty_origins() {
	let mut session = MemorySession::new()
		.with_url("https://app.example.com/home")
		.with_cookie(Cookie::new("sid", "1", ".example.com", "/").http_only(true))
		.with_local_storage("https://app.example.com", "token", "t")
		.with_local_storage("https://app.example.com", "user", "7")
		.with_local_storage("https://auth.example.com", "nonce", "n");

	let snapshot = capture(&mut session).await.unwrap();

	assert_eq!(snapshot.cookies, [Cookie::new("sid", "1", ".example.com", "/").http_only(true)]);
	assert_eq!(snapshot.origins.len(), 2);
	assert_eq!(snapshot.origins[0].origin, "https://app.example.com");
	assert_eq!(
		snapshot.origins[0].local_storage,
		[LocalStorageEntry::new("token", "t"), LocalStorageEntry::new("user", "7")]
	);
	assert_eq!(snapshot.origins[1].origin, "https://auth.example.com");
}

#[tokio::test]
async fn capture_does_not_mutate_the_tab() {
	let mut session = MemorySession::new()
		.with_url("https://example.com/")
		.with_cookie(Cookie::new("a", "b", "example.com", "/"))
		.with_local_storage("https://example.com", "k", "v");

	capture(&mut session).await.unwrap();

	assert_eq!(session.mutation_count(), 0);
	assert_eq!(session.url(), "https://example.com/");
	assert_eq!(
		session.calls(),
		[
			SessionCall::Cookies,
			SessionCall::StorageOrigins,
			SessionCall::LocalStorage("https://example.com".into())
		]
	);
}

#[tokio::test]
async fn empty_tab_captures_empty_snapshot() {
	let mut session = MemorySession::new();

	let snapshot = capture(&mut session).await.unwrap();

	assert!(snapshot.is_empty());
}

#[tokio::test]
async fn inactive_session_cannot_be_captured() {
	let mut session = MemorySession::inactive();

	assert!(matches!(capture(&mut session).await, Err(Error::SessionUnavailable)));
	assert!(session.calls().is_empty());
}

#[tokio::test]
async fn capture_to_file_writes_the_snapshot() {
	let serializer = Serializer::new(MemoryFs::new());
	let mut session = MemorySession::new()
		.with_cookie(Cookie::new("session", "abc", "example.com", "/"))
		.with_local_storage("https://example.com", "theme", "dark");

	let snapshot = capture_to_file(&mut session, &serializer, "/tmp/auth/state.json".as_ref()).await.unwrap();

	assert_eq!(serializer.load("/tmp/auth/state.json".as_ref()).await.unwrap(), snapshot);
}

#[tokio::test]
async fn capture_to_file_writes_nothing_for_inactive_session() {
	let serializer = Serializer::new(MemoryFs::new());
	let mut session = MemorySession::inactive();

	let err = capture_to_file(&mut session, &serializer, "/tmp/state.json".as_ref()).await.unwrap_err();

	assert!(matches!(err, Error::SessionUnavailable));
	assert!(serializer.fs().contents("/tmp/state.json").is_none());
}
