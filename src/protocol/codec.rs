//! Protocol codec
//!
//! Versioned encoding and decoding of command and response payloads.
//!
//! ## Payload Format (protocol 3)
//!
//! ### Command
//! ```text
//! [0, message_id, "Command:Name", {parameters}]
//! ```
//!
//! ### Response
//! ```text
//! [1, message_id, error_or_null, result_or_null]
//! ```
//!
//! The version is chosen once per connection from the handshake greeting,
//! through a [`CodecRegistry`].

use std::collections::HashMap;
use std::fmt;

use serde_json::value::RawValue;
use serde_json::Value;

use super::message::{COMMAND_MESSAGE, RESPONSE_MESSAGE};
use super::{Command, DriverError, Response, ResponseBody};
use crate::error::{MarionetteError, Result};

/// Protocol version spoken by current Firefox releases
pub const PROTOCOL_V3: u32 = 3;

/// Number of elements in a command or response tuple
const TUPLE_LEN: usize = 4;

/// Encoder/decoder for one protocol version
pub trait Codec: Send + Sync + fmt::Debug {
    /// Protocol version this codec speaks
    fn version(&self) -> u32;

    /// Serialize a command into a payload (unframed)
    fn encode(&self, command: &Command) -> Result<Vec<u8>>;

    /// Parse a payload into a response envelope
    fn decode(&self, payload: &[u8]) -> Result<Response>;
}

/// Builds a fresh codec for a connection
pub type CodecFactory = fn() -> Box<dyn Codec>;

// =============================================================================
// Registry
// =============================================================================

/// Maps protocol versions to codec factories
#[derive(Clone)]
pub struct CodecRegistry {
    factories: HashMap<u32, CodecFactory>,
}

impl CodecRegistry {
    /// Registry with no versions at all
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register (or replace) the factory for `version`
    pub fn register(&mut self, version: u32, factory: CodecFactory) -> &mut Self {
        self.factories.insert(version, factory);
        self
    }

    pub fn supports(&self, version: u32) -> bool {
        self.factories.contains_key(&version)
    }

    /// Build the codec for `version`
    pub fn resolve(&self, version: u32) -> Result<Box<dyn Codec>> {
        self.factories
            .get(&version)
            .map(|factory| factory())
            .ok_or(MarionetteError::UnsupportedProtocolVersion(version))
    }

    /// Registered versions, ascending
    pub fn versions(&self) -> Vec<u32> {
        let mut versions: Vec<u32> = self.factories.keys().copied().collect();
        versions.sort_unstable();
        versions
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(PROTOCOL_V3, || Box::new(CodecV3));
        registry
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("versions", &self.versions())
            .finish()
    }
}

/// Resolve a codec from the default registry
pub fn resolve(version: u32) -> Result<Box<dyn Codec>> {
    CodecRegistry::default().resolve(version)
}

// =============================================================================
// Protocol 3
// =============================================================================

/// JSON tuple codec for protocol 3
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecV3;

impl Codec for CodecV3 {
    fn version(&self) -> u32 {
        PROTOCOL_V3
    }

    fn encode(&self, command: &Command) -> Result<Vec<u8>> {
        let empty = Value::Object(Default::default());
        let parameters = match &command.parameters {
            Value::Null => &empty,
            other => other,
        };

        serde_json::to_vec(&(COMMAND_MESSAGE, command.id, &command.name, parameters))
            .map_err(MarionetteError::Encode)
    }

    fn decode(&self, payload: &[u8]) -> Result<Response> {
        let slots: Vec<Box<RawValue>> = serde_json::from_slice(payload)
            .map_err(|e| MarionetteError::Protocol(format!("response is not a JSON array: {}", e)))?;

        let [message_type, message_id, error, result]: [Box<RawValue>; TUPLE_LEN] =
            slots.try_into().map_err(|slots: Vec<Box<RawValue>>| {
                MarionetteError::Protocol(format!(
                    "response has {} elements, expected {}",
                    slots.len(),
                    TUPLE_LEN
                ))
            })?;

        let message_type: u8 = parse_slot(&message_type, "message type")?;
        if message_type != RESPONSE_MESSAGE {
            return Err(MarionetteError::Protocol(format!(
                "unexpected message type {}, expected {}",
                message_type, RESPONSE_MESSAGE
            )));
        }

        let message_id: u64 = parse_slot(&message_id, "message id")?;

        // A populated error slot wins over any result.
        let body = if is_null(&error) {
            ResponseBody::Value(result)
        } else {
            let driver_error: DriverError = parse_slot(&error, "error object")?;
            ResponseBody::Error(driver_error)
        };

        Ok(Response {
            message_id,
            size: payload.len(),
            body,
        })
    }
}

fn is_null(raw: &RawValue) -> bool {
    raw.get().trim() == "null"
}

fn parse_slot<T: serde::de::DeserializeOwned>(raw: &RawValue, what: &str) -> Result<T> {
    serde_json::from_str(raw.get())
        .map_err(|e| MarionetteError::Protocol(format!("invalid {} {}: {}", what, raw.get(), e)))
}
