//! Client
//!
//! Thin, thread-safe handle over a [`Transport`] with session bootstrap.
//!
//! Clones share one connection; each call holds the lock for a full
//! command/response exchange, which keeps a single request in flight.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::Result;
use crate::network::Transport;
use crate::protocol::Response;

/// Session returned by `WebDriver:NewSession`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,

    #[serde(default)]
    pub capabilities: Value,
}

/// Session timeouts, in milliseconds on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeouts {
    /// Interrupt scripts running longer than this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<u64>,

    /// Interrupt navigation taking longer than this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_load: Option<u64>,

    /// Implicit wait when locating elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<u64>,
}

impl Timeouts {
    pub fn script(timeout: Duration) -> Self {
        Self {
            script: Some(timeout.as_millis() as u64),
            ..Self::default()
        }
    }

    pub fn page_load(timeout: Duration) -> Self {
        Self {
            page_load: Some(timeout.as_millis() as u64),
            ..Self::default()
        }
    }

    pub fn implicit(timeout: Duration) -> Self {
        Self {
            implicit: Some(timeout.as_millis() as u64),
            ..Self::default()
        }
    }
}

/// Most commands wrap their result as `{"value": ...}`
#[derive(Deserialize)]
struct ValueWrapper<T> {
    value: T,
}

/// Shared handle to one Marionette connection
#[derive(Clone)]
pub struct Client {
    transport: Arc<Mutex<Transport>>,
    session: Arc<RwLock<Option<Session>>>,
}

impl Client {
    pub fn new(config: Config) -> Self {
        Self::from_transport(Transport::new(config))
    }

    /// Wrap an existing (possibly connected) transport
    pub fn from_transport(transport: Transport) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            session: Arc::new(RwLock::new(None)),
        }
    }

    pub fn connect(&self, addr: &str) -> Result<()> {
        self.transport.lock().connect(addr)
    }

    /// Close the connection and forget the session
    pub fn close(&self) -> Result<()> {
        *self.session.write() = None;
        self.transport.lock().close()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.lock().is_connected()
    }

    pub fn send<P: Serialize + ?Sized>(&self, name: &str, params: &P) -> Result<Response> {
        self.transport.lock().send(name, params)
    }

    pub fn send_and_decode<T, P>(&self, name: &str, params: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.transport.lock().send_and_decode(name, params)
    }

    /// Send a command and unwrap the `value` field of its result
    pub fn value<T, P>(&self, name: &str, params: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let wrapper: ValueWrapper<T> = self.send_and_decode(name, params)?;
        Ok(wrapper.value)
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    /// Start a WebDriver session, optionally asking for a specific id
    pub fn new_session(
        &self,
        session_id: Option<&str>,
        capabilities: Option<Value>,
    ) -> Result<Session> {
        let mut params = json!({ "capabilities": capabilities.unwrap_or(Value::Null) });
        if let Some(id) = session_id {
            params["sessionId"] = Value::from(id);
        }

        let session: Session = self.send_and_decode("WebDriver:NewSession", &params)?;
        tracing::debug!("Started session {}", session.session_id);
        *self.session.write() = Some(session.clone());
        Ok(session)
    }

    /// End the session. The server drops the socket afterwards, so the
    /// connection is closed as well.
    ///
    /// Once a reply arrives the session is forgotten and the connection
    /// closed, even when the reply is a driver error; that error is then
    /// returned.
    pub fn delete_session(&self) -> Result<()> {
        let mut transport = self.transport.lock();
        let response = transport.send("WebDriver:DeleteSession", &())?;

        *self.session.write() = None;
        let closed = transport.close();

        response.into_result()?;
        closed
    }

    pub fn session_id(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.session_id.clone())
    }

    /// Capabilities currently in effect
    pub fn capabilities(&self) -> Result<Value> {
        #[derive(Deserialize)]
        struct Wrapper {
            capabilities: Value,
        }

        let wrapper: Wrapper = self.send_and_decode("WebDriver:GetCapabilities", &())?;
        Ok(wrapper.capabilities)
    }

    pub fn set_timeouts(&self, timeouts: &Timeouts) -> Result<()> {
        self.send("WebDriver:SetTimeouts", timeouts)?.into_result()?;
        Ok(())
    }

    pub fn timeouts(&self) -> Result<Timeouts> {
        self.send_and_decode("WebDriver:GetTimeouts", &())
    }
}
