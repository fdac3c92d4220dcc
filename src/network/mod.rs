//! Network Module
//!
//! TCP transport for the Marionette protocol.
//!
//! ## Lifecycle
//! ```text
//! Disconnected ──connect──▶ Connecting ──handshake ok──▶ Ready
//!      ▲                        │                          │
//!      └────────failure─────────┘◀──close / fatal error────┘
//! ```
//!
//! - One command in flight per connection
//! - Message ids start at 1 on every new connection
//! - Codec and protocol version are fixed after the handshake

mod transport;

pub use transport::{Transport, TransportState};
