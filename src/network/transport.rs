//! Transport
//!
//! Owns the socket, runs the handshake, and exchanges one command and one
//! response at a time.

use std::io::{self, BufReader, BufWriter, ErrorKind};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::{MarionetteError, Result};
use crate::protocol::{
    read_frame_limited, write_frame, Codec, CodecRegistry, Command, Handshake, Response,
};

/// Bytes of an outgoing payload logged from each end in debug mode
const DEBUG_PAYLOAD_EDGE: usize = 512;

/// Lifecycle state of a Transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Disconnected,
    Connecting,
    Ready,
}

/// State of one established connection
struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: String,

    /// Greeting received from the remote end
    handshake: Handshake,

    /// Codec bound for the lifetime of the connection
    codec: Box<dyn Codec>,

    /// Last message id assigned (0 before the first command)
    message_id: u64,
}

impl Connection {
    /// Dial, configure deadlines, and read the handshake
    fn open(addr: &str, timeout: Duration, config: &Config, registry: &CodecRegistry) -> Result<Self> {
        let stream = dial(addr, timeout)?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let deadline = (!config.io_timeout.is_zero()).then_some(config.io_timeout);
        stream.set_read_timeout(deadline)?;
        stream.set_write_timeout(deadline)?;

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| addr.to_string());

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let mut reader = BufReader::new(read_stream);
        let writer = BufWriter::new(stream);

        let greeting = read_frame_limited(&mut reader, config.max_frame_size)?;
        let handshake: Handshake = serde_json::from_slice(&greeting).map_err(|e| {
            MarionetteError::Handshake(format!("{} in {:?}", e, String::from_utf8_lossy(&greeting)))
        })?;

        let codec = registry.resolve(handshake.marionette_protocol)?;

        Ok(Self {
            reader,
            writer,
            peer_addr,
            handshake,
            codec,
            message_id: 0,
        })
    }

    /// Write one command and block for its response
    fn round_trip(&mut self, name: &str, parameters: serde_json::Value, config: &Config) -> Result<Response> {
        let command = Command::new(self.message_id + 1, name, parameters);
        let payload = self.codec.encode(&command)?;
        self.message_id = command.id;

        if config.debug_payloads {
            log_payload(&payload);
        }

        write_frame(&mut self.writer, &payload)?;
        tracing::trace!(
            "Sent {} (id {}, {} bytes) to {}",
            command.name,
            command.id,
            payload.len(),
            self.peer_addr
        );

        let reply = read_frame_limited(&mut self.reader, config.max_frame_size)?;
        let response = self.codec.decode(&reply)?;
        tracing::trace!(
            "Received response id {} ({} bytes) from {}",
            response.message_id,
            response.size,
            self.peer_addr
        );

        if config.verify_message_id && response.message_id != command.id {
            return Err(MarionetteError::ProtocolDesync {
                expected: command.id,
                received: response.message_id,
            });
        }

        Ok(response)
    }

    fn shutdown(self) -> io::Result<()> {
        match self.writer.get_ref().shutdown(Shutdown::Both) {
            Err(e) if e.kind() != ErrorKind::NotConnected => Err(e),
            _ => Ok(()),
        }
    }
}

/// Client side of a Marionette connection
///
/// One command is in flight at a time: every call blocks until its
/// response arrives. Wrap the transport in a mutex (see
/// [`Client`](crate::Client)) to share it between threads.
pub struct Transport {
    config: Config,
    registry: CodecRegistry,
    state: TransportState,
    conn: Option<Connection>,
}

impl Transport {
    /// Create a disconnected transport with the default codec registry
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, CodecRegistry::default())
    }

    /// Create a disconnected transport resolving codecs from `registry`
    pub fn with_registry(config: Config, registry: CodecRegistry) -> Self {
        Self {
            config,
            registry,
            state: TransportState::Disconnected,
            conn: None,
        }
    }

    /// Connect and perform the handshake, using the configured dial timeout.
    ///
    /// An empty `addr` falls back to `Config::address`.
    pub fn connect(&mut self, addr: &str) -> Result<()> {
        let timeout = self.config.connect_timeout;
        self.connect_timeout(addr, timeout)
    }

    /// Connect with an explicit dial timeout
    ///
    /// On any failure the transport stays `Disconnected` and can be
    /// connected again.
    pub fn connect_timeout(&mut self, addr: &str, timeout: Duration) -> Result<()> {
        if self.state != TransportState::Disconnected {
            return Err(MarionetteError::AlreadyConnected);
        }

        let addr = if addr.is_empty() {
            self.config.address.clone()
        } else {
            addr.to_string()
        };

        self.state = TransportState::Connecting;
        match Connection::open(&addr, timeout, &self.config, &self.registry) {
            Ok(conn) => {
                tracing::debug!(
                    "Connected to {} ({} protocol {})",
                    conn.peer_addr,
                    conn.handshake.application_type,
                    conn.handshake.marionette_protocol
                );
                self.conn = Some(conn);
                self.state = TransportState::Ready;
                Ok(())
            }
            Err(e) => {
                tracing::debug!("Connection to {} failed: {}", addr, e);
                self.state = TransportState::Disconnected;
                Err(e)
            }
        }
    }

    /// Send a command and wait for its response
    ///
    /// A remote failure is a successful call: inspect
    /// [`Response::driver_error`]. Fatal errors close the connection.
    pub fn send<P: Serialize + ?Sized>(&mut self, name: &str, params: &P) -> Result<Response> {
        let conn = match (self.state, self.conn.as_mut()) {
            (TransportState::Ready, Some(conn)) => conn,
            _ => return Err(MarionetteError::NotConnected),
        };

        let parameters = serde_json::to_value(params).map_err(MarionetteError::Encode)?;

        let result = conn.round_trip(name, parameters, &self.config);
        if let Err(ref e) = result {
            if e.is_fatal() {
                tracing::warn!("Dropping connection to {} after {}: {}", conn.peer_addr, name, e);
                self.teardown();
            }
        }
        result
    }

    /// Send a command and decode its success value into `T`
    ///
    /// A remote failure is returned as `MarionetteError::Driver`.
    pub fn send_and_decode<T, P>(&mut self, name: &str, params: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.send(name, params)?.decode()
    }

    /// Close the socket. Does nothing when already disconnected.
    pub fn close(&mut self) -> Result<()> {
        self.state = TransportState::Disconnected;
        match self.conn.take() {
            Some(conn) => {
                tracing::debug!("Closing connection to {}", conn.peer_addr);
                conn.shutdown()?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn teardown(&mut self) {
        if let Err(e) = self.close() {
            tracing::debug!("Error while closing broken connection: {}", e);
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == TransportState::Ready
    }

    /// Application type announced in the handshake
    pub fn application_type(&self) -> Option<&str> {
        self.conn.as_ref().map(|c| c.handshake.application_type.as_str())
    }

    /// Protocol version negotiated in the handshake
    pub fn protocol_version(&self) -> Option<u32> {
        self.conn.as_ref().map(|c| c.codec.version())
    }

    /// Last message id assigned on the current connection
    pub fn message_id(&self) -> u64 {
        self.conn.as_ref().map_or(0, |c| c.message_id)
    }

    pub fn peer_addr(&self) -> Option<&str> {
        self.conn.as_ref().map(|c| c.peer_addr.as_str())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Try every resolved address in turn
fn dial(addr: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;

    for socket_addr in addr.to_socket_addrs()? {
        let attempt = if timeout.is_zero() {
            TcpStream::connect(socket_addr)
        } else {
            TcpStream::connect_timeout(&socket_addr, timeout)
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(ErrorKind::InvalidInput, format!("{} resolved to no addresses", addr))
    }))
}

fn log_payload(payload: &[u8]) {
    if payload.len() >= DEBUG_PAYLOAD_EDGE * 2 {
        tracing::debug!(
            "{} - END - {}",
            String::from_utf8_lossy(&payload[..DEBUG_PAYLOAD_EDGE]),
            String::from_utf8_lossy(&payload[payload.len() - DEBUG_PAYLOAD_EDGE..])
        );
    } else {
        tracing::debug!("{}", String::from_utf8_lossy(payload));
    }
}
