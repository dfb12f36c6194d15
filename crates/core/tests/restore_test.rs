//! Restore sequencing against an in-memory tab.

use pw_state::testing::{MemoryFs, MemorySession, SessionCall};
use pw_state::{
	Cookie, Error, LocalStorageEntry, OriginState, RestoreStage, ScriptCall, Serializer, Session, StorageState, capture, restore,
	restore_from_file,
};

fn example_snapshot() -> StorageState {
	StorageState::new(
		vec![Cookie::new("session", "abc", "example.com", "/")],
		vec![OriginState::new("https://example.com", vec![LocalStorageEntry::new("theme", "dark")])],
	)
}

#[tokio::test]
async fn restores_cookie_and_local_storage() {
	let mut session = MemorySession::new();

	let progress = restore(&mut session, &example_snapshot()).await.unwrap();

	assert_eq!(progress.stage, RestoreStage::Done);
	assert_eq!(progress.cookies_applied, 1);
	assert_eq!(progress.origins_completed, 1);
	assert_eq!(progress.entries_written, 1);

	let jar = session.cookie_jar();
	assert_eq!(jar.len(), 1);
	assert_eq!((jar[0].name.as_str(), jar[0].value.as_str(), jar[0].domain.as_str()), ("session", "abc", "example.com"));

	let theme = session.evaluate(&ScriptCall::get_local_storage_item("theme")).await.unwrap();
	assert_eq!(theme, "dark");
	assert!(session.url().starts_with("https://example.com"));
}

#[tokio::test]
async fn empty_snapshot_touches_nothing() {
	let mut session = MemorySession::new();

	let progress = restore(&mut session, &StorageState::default()).await.unwrap();

	assert_eq!(progress.stage, RestoreStage::Done);
	assert!(session.navigations().is_empty());
	assert_eq!(session.mutation_count(), 0);
	assert!(session.cookie_jar().is_empty());
}

#[tokio::test]
async fn cookies_are_applied_in_one_batch_before_navigation() {
	let snapshot = StorageState::new(
		vec![
			Cookie::new("a", "1", "a.test", "/"),
			Cookie::new("b", "2", "b.test", "/").secure(true),
		],
		vec![
			OriginState::new("https://a.test", vec![LocalStorageEntry::new("k", "v")]),
			OriginState::new("https://b.test", vec![LocalStorageEntry::new("k", "w")]),
		],
	);
	let mut session = MemorySession::new();

	restore(&mut session, &snapshot).await.unwrap();

	let calls = session.calls();
	assert_eq!(calls[0], SessionCall::AddCookies(2));
	assert_eq!(calls.iter().filter(|c| matches!(c, SessionCall::AddCookies(_))).count(), 1);
	assert_eq!(session.navigations(), ["https://a.test", "https://b.test"]);
}

#[tokio::test]
async fn injection_happens_on_the_target_origin() {
	let snapshot = StorageState::new(
		vec![],
		vec![
			OriginState::new("https://a.test", vec![LocalStorageEntry::new("x", "1")]),
			OriginState::new("https://b.test:8443", vec![LocalStorageEntry::new("y", "2")]),
			OriginState::new("http://localhost:3000", vec![LocalStorageEntry::new("z", "3")]),
		],
	);
	let mut session = MemorySession::new();

	restore(&mut session, &snapshot).await.unwrap();

	let evaluations = session.evaluations();
	assert_eq!(evaluations.len(), 3);
	for (url, origin) in evaluations.iter().zip(&snapshot.origins) {
		assert!(url.starts_with(&origin.origin), "{url} does not start with {}", origin.origin);
	}
	assert_eq!(session.local_storage_item("https://b.test:8443", "y"), Some("2"));
	assert_eq!(session.local_storage_item("http://localhost:3000", "z"), Some("3"));
}

#[tokio::test]
async fn skips_navigation_when_already_on_origin() {
	let mut session = MemorySession::new().with_url("https://example.com/dashboard");

	let progress = restore(&mut session, &example_snapshot()).await.unwrap();

	assert_eq!(progress.navigations, 0);
	assert!(session.navigations().is_empty());
	assert_eq!(session.url(), "https://example.com/dashboard");
	assert_eq!(session.local_storage_item("https://example.com", "theme"), Some("dark"));
}

#[tokio::test]
async fn origin_without_entries_is_still_visited() {
	let snapshot = StorageState::new(vec![], vec![OriginState::new("https://empty.test", vec![])]);
	let mut session = MemorySession::new();

	let progress = restore(&mut session, &snapshot).await.unwrap();

	assert_eq!(session.navigations(), ["https://empty.test"]);
	assert!(session.evaluations().is_empty());
	assert_eq!(progress.origins_completed, 1);
}

#[tokio::test]
async fn later_duplicate_names_win() {
	let snapshot = StorageState::new(
		vec![],
		vec![OriginState::new(
			"https://example.com",
			vec![
				LocalStorageEntry::new("theme", "light"),
				LocalStorageEntry::new("lang", "en"),
				LocalStorageEntry::new("theme", "dark"),
			],
		)],
	);
	let mut session = MemorySession::new();

	restore(&mut session, &snapshot).await.unwrap();

	assert_eq!(session.evaluations().len(), 1);
	assert_eq!(session.local_storage_item("https://example.com", "theme"), Some("dark"));
	assert_eq!(session.local_storage_item("https://example.com", "lang"), Some("en"));
}

#[tokio::test]
async fn duplicate_origins_keep_the_last_entry() {
	let snapshot = StorageState::new(
		vec![],
		vec![
			OriginState::new("https://a.test", vec![LocalStorageEntry::new("old", "1")]),
			OriginState::new("https://b.test", vec![LocalStorageEntry::new("k", "v")]),
			OriginState::new("https://a.test", vec![LocalStorageEntry::new("new", "2")]),
		],
	);
	let mut session = MemorySession::new();

	let progress = restore(&mut session, &snapshot).await.unwrap();

	assert_eq!(progress.origins_completed, 2);
	assert_eq!(session.navigations(), ["https://b.test", "https://a.test"]);
	assert_eq!(session.local_storage_item("https://a.test", "new"), Some("2"));
	assert_eq!(session.local_storage_item("https://a.test", "old"), None);
}

#[tokio::test]
async fn restoring_twice_matches_restoring_once() {
	let snapshot = StorageState::new(
		vec![Cookie::new("sid", "1", "a.test", "/"), Cookie::new("pref", "x", "b.test", "/app")],
		vec![
			OriginState::new("https://a.test", vec![LocalStorageEntry::new("k", "v")]),
			OriginState::new("https://b.test", vec![LocalStorageEntry::new("k", "w")]),
		],
	);

	let mut once = MemorySession::new();
	restore(&mut once, &snapshot).await.unwrap();

	let mut twice = MemorySession::new();
	restore(&mut twice, &snapshot).await.unwrap();
	restore(&mut twice, &snapshot).await.unwrap();

	assert_eq!(once.cookie_jar(), twice.cookie_jar());
	assert_eq!(capture(&mut once).await.unwrap(), capture(&mut twice).await.unwrap());
}

#[tokio::test]
async fn restore_then_capture_round_trips() {
	let snapshot = StorageState::new(
		vec![
			Cookie::new("sid", "abc", ".example.com", "/").http_only(true).secure(true).same_site("Lax").expires(-1.0),
			Cookie::new("pref", "compact", "app.example.com", "/settings").expires(1_900_000_000.0),
		],
		vec![
			OriginState::new(
				"https://app.example.com",
				vec![LocalStorageEntry::new("token", "t-1"), LocalStorageEntry::new("user", "{\"id\":7}")],
			),
			OriginState::new("https://auth.example.com", vec![LocalStorageEntry::new("nonce", "n")]),
		],
	);
	let mut session = MemorySession::new();

	restore(&mut session, &snapshot).await.unwrap();
	let captured = capture(&mut session).await.unwrap();

	assert_eq!(captured, snapshot);
}

#[tokio::test]
async fn inactive_session_is_rejected() {
	let mut session = MemorySession::inactive();

	let err = restore(&mut session, &example_snapshot()).await.unwrap_err();

	assert!(matches!(err, Error::SessionUnavailable));
	assert!(session.calls().is_empty());
}

#[tokio::test]
async fn navigation_failure_keeps_earlier_state() {
	let snapshot = StorageState::new(
		vec![Cookie::new("sid", "1", "a.test", "/")],
		vec![
			OriginState::new("https://a.test", vec![LocalStorageEntry::new("k", "v")]),
			OriginState::new("https://down.test", vec![LocalStorageEntry::new("k", "v")]),
			OriginState::new("https://c.test", vec![LocalStorageEntry::new("k", "v")]),
		],
	);
	let mut session = MemorySession::new().fail_navigation_to("https://down.test");

	let err = restore(&mut session, &snapshot).await.unwrap_err();

	assert!(matches!(err.root(), Error::Navigation { url, .. } if url == "https://down.test"));
	assert!(err.is_partial());
	let progress = err.progress().unwrap();
	assert_eq!(progress.cookies_applied, 1);
	assert_eq!(progress.origins_completed, 1);
	assert_eq!(
		progress.stage,
		RestoreStage::Navigating {
			origin: "https://down.test".into()
		}
	);

	// no rollback, and nothing after the failure
	assert_eq!(session.cookie_jar().len(), 1);
	assert_eq!(session.local_storage_item("https://a.test", "k"), Some("v"));
	assert!(!session.navigations().contains(&"https://c.test"));
}

#[tokio::test]
async fn script_failure_aborts_restore() {
	let mut session = MemorySession::new().fail_scripts();

	let err = restore(&mut session, &example_snapshot()).await.unwrap_err();

	assert!(matches!(err.root(), Error::ScriptEvaluation(_)));
	assert_eq!(
		err.progress().map(|p| &p.stage),
		Some(&RestoreStage::Injecting {
			origin: "https://example.com".into()
		})
	);
	assert_eq!(session.cookie_jar().len(), 1);
}

#[tokio::test]
async fn malformed_file_fails_before_any_mutation() {
	let fs = MemoryFs::new();
	fs.insert("/state/bad.json", "this is { not json");
	let serializer = Serializer::new(fs);
	let mut session = MemorySession::new();

	let err = restore_from_file(&mut session, &serializer, "/state/bad.json".as_ref()).await.unwrap_err();

	assert!(matches!(err, Error::Parse { .. }));
	assert!(session.calls().is_empty());
}

#[tokio::test]
async fn restore_from_file_applies_saved_snapshot() {
	let serializer = Serializer::new(MemoryFs::new());
	serializer.save(&example_snapshot(), "/home/user/.auth/example.json".as_ref()).await.unwrap();
	let mut session = MemorySession::new();

	let progress = restore_from_file(&mut session, &serializer, "/home/user/.auth/example.json".as_ref())
		.await
		.unwrap();

	assert_eq!(progress.cookies_applied, 1);
	assert_eq!(session.local_storage_item("https://example.com", "theme"), Some("dark"));
}
