//! Protocol Module
//!
//! Defines the wire protocol spoken with the Marionette server.
//!
//! ## Frame Format
//! ```text
//! ┌────────────────────┬─────┬─────────────────────────────┐
//! │ Len (ASCII digits) │ ':' │     Payload (Len bytes)     │
//! └────────────────────┴─────┴─────────────────────────────┘
//! ```
//!
//! ### Payloads (protocol 3, JSON)
//! - Handshake: `{"applicationType": "gecko", "marionetteProtocol": 3}`
//! - Command:   `[0, id, name, params]`
//! - Response:  `[1, id, error | null, result | null]`

mod frame;
mod message;
mod codec;

pub use frame::{encode_frame, read_frame, read_frame_limited, write_frame, DELIMITER};
pub use message::{Command, DriverError, Handshake, Response, ResponseBody};
pub use message::{COMMAND_MESSAGE, RESPONSE_MESSAGE};
pub use codec::{resolve, Codec, CodecFactory, CodecRegistry, CodecV3, PROTOCOL_V3};
