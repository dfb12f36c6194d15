//! Capture and restore browser session state.
//!
//! A session-state snapshot ([`StorageState`]) holds the cookie jar and the
//! localStorage contents of each origin. This crate reads that state out of a
//! live tab, persists it as JSON, and replays it into a tab later so an
//! authenticated session can be resumed without logging in again.
//!
//! ```text
//! save:    capture(session) ──► Serializer::save(path)
//! restore: Serializer::load(path) ──► restore(session)
//! ```
//!
//! The browser is reached through the [`Session`] trait and the disk through
//! [`Filesystem`]. [`cdp::CdpSession`] drives a Chromium tab over the DevTools
//! protocol; [`testing::MemorySession`] is an in-memory stand-in.
//!
//! # Example
//!
//! ```ignore
//! use pw_state::{Serializer, capture, restore_from_file};
//! use pw_state::cdp::CdpSession;
//!
//! let mut session = CdpSession::connect(ws_url, timeout).await?;
//! let serializer = Serializer::local();
//!
//! let snapshot = capture(&mut session).await?;
//! serializer.save(&snapshot, "/home/me/.auth/github.json".as_ref()).await?;
//!
//! // later, in a fresh browser
//! restore_from_file(&mut session, &serializer, "/home/me/.auth/github.json".as_ref()).await?;
//! ```

pub mod capture;
pub mod cdp;
pub mod error;
pub mod fs;
pub mod restore;
pub mod script;
pub mod serializer;
pub mod session;
pub mod testing;

pub use capture::{capture, capture_to_file};
pub use error::{Error, Result};
pub use fs::{Filesystem, LocalFs};
pub use pw_state_protocol::{Cookie, LocalStorageEntry, OriginState, StorageState};
pub use restore::{RestoreProgress, RestoreStage, restore, restore_from_file};
pub use script::ScriptCall;
pub use serializer::Serializer;
pub use session::Session;
