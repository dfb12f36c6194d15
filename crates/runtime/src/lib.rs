//! Chrome DevTools Protocol runtime for pw-state.
//!
//! This crate provides the low-level plumbing for talking to a browser tab
//! over CDP:
//!
//! - **Transport**: JSON frames over a WebSocket
//! - **Connection**: JSON-RPC request/response correlation, event broadcast
//!   and per-command timeouts
//!
//! ```text
//! ┌──────────────┐
//! │   pw-state   │  CdpSession (cookies, navigation, evaluation)
//! └──────┬───────┘
//!        │ send / subscribe
//! ┌──────▼───────┐
//! │  Connection  │  id correlation, events
//! └──────┬───────┘
//! ┌──────▼───────┐
//! │  Transport   │  WebSocket frames
//! └──────────────┘
//! ```

pub mod connection;
pub mod error;
pub mod transport;

pub use connection::{Connection, Event, Message, Request, Response};
pub use error::{Error, Result};
pub use transport::{Transport, TransportParts, TransportReceiver, WebSocketTransport};
