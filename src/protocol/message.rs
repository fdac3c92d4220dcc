//! Message definitions
//!
//! Handshake greeting, outgoing commands, and the response envelope.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{MarionetteError, Result};

/// Message type tag of an outgoing command
pub const COMMAND_MESSAGE: u8 = 0;

/// Message type tag of a response
pub const RESPONSE_MESSAGE: u8 = 1;

/// First frame sent by the remote end after the socket is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Application type, "gecko" for Firefox
    pub application_type: String,

    /// Protocol version spoken on this connection
    pub marionette_protocol: u32,
}

/// A command to send to the remote end
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Per-connection message id, starting at 1
    pub id: u64,

    /// Command name, e.g. "WebDriver:GetTitle"
    pub name: String,

    /// Command parameters. `Null` is sent as an empty object.
    pub parameters: Value,
}

impl Command {
    pub fn new(id: u64, name: impl Into<String>, parameters: Value) -> Self {
        Self {
            id,
            name: name.into(),
            parameters,
        }
    }
}

/// A failure reported by the remote end
///
/// Field names match the wire format exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverError {
    /// Error type, e.g. "no such element"
    pub error: String,

    /// Human-readable message
    pub message: String,

    /// Remote stack trace, if any
    pub stacktrace: Option<String>,
}

impl DriverError {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            stacktrace: None,
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for DriverError {}

/// Either the raw success value or the remote failure, never both
#[derive(Debug, Clone)]
pub enum ResponseBody {
    /// Raw JSON text of the result, left for the caller to interpret
    Value(Box<RawValue>),

    /// Failure reported by the remote end
    Error(DriverError),
}

/// A decoded response to one command
#[derive(Debug, Clone)]
pub struct Response {
    /// Message id echoed by the remote end
    pub message_id: u64,

    /// Size of the received payload in bytes
    pub size: usize,

    pub body: ResponseBody,
}

impl Response {
    /// Raw success JSON, or None for a driver error
    pub fn value(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Value(raw) => Some(raw.get()),
            ResponseBody::Error(_) => None,
        }
    }

    /// The remote failure, or None on success
    pub fn driver_error(&self) -> Option<&DriverError> {
        match &self.body {
            ResponseBody::Value(_) => None,
            ResponseBody::Error(e) => Some(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Value(_))
    }

    /// Decode the success value into `T`
    ///
    /// A driver error is returned as `MarionetteError::Driver`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.body {
            ResponseBody::Value(raw) => {
                serde_json::from_str(raw.get()).map_err(MarionetteError::Decode)
            }
            ResponseBody::Error(e) => Err(MarionetteError::Driver(e.clone())),
        }
    }

    /// Turn the envelope into a plain result
    pub fn into_result(self) -> Result<Box<RawValue>> {
        match self.body {
            ResponseBody::Value(raw) => Ok(raw),
            ResponseBody::Error(e) => Err(MarionetteError::Driver(e)),
        }
    }
}
