//! # Marionette
//!
//! Synchronous client transport for Firefox's Marionette remote protocol:
//! - Length-prefixed framing, tolerant of arbitrarily split reads
//! - Handshake with per-connection protocol version negotiation
//! - Versioned command/response codecs behind a registry
//! - One command in flight per connection, with message id checks
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Client                               │
//! │            (Arc<Mutex<Transport>>, session state)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ send / send_and_decode
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Transport                              │
//! │        (socket, handshake, message ids, deadlines)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Codec    │          │    Frame    │
//!   │ (versioned) │          │  "len:..."  │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use marionette::{Config, Transport};
//!
//! # fn main() -> marionette::Result<()> {
//! let mut transport = Transport::new(Config::default());
//! transport.connect("")?;
//! let response = transport.send("WebDriver:GetTitle", &())?;
//! println!("{:?}", response.value());
//! transport.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MarionetteError, Result};
pub use config::{Config, DEFAULT_ADDRESS};
pub use network::{Transport, TransportState};
pub use protocol::{DriverError, Response, ResponseBody};
pub use client::{Client, Session, Timeouts};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
