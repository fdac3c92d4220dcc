//! Configuration for the Marionette transport
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Address used when the caller does not supply one
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:2828";

/// Main configuration for a Transport instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Remote end address (host:port), used when `connect` is given ""
    pub address: String,

    /// Maximum time to wait for the TCP dial
    pub connect_timeout: Duration,

    /// Deadline for every blocking read and write.
    /// Commands such as script evaluation can run for minutes, so this is
    /// much longer than a usual RPC timeout.
    pub io_timeout: Duration,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Upper bound on incoming frame size in bytes (None = uncapped)
    pub max_frame_size: Option<usize>,

    /// Fail with ProtocolDesync when a response echoes the wrong message id
    pub verify_message_id: bool,

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------
    /// Log outgoing payloads at debug level
    pub debug_payloads: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(5 * 60),
            max_frame_size: None,
            verify_message_id: true,
            debug_payloads: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the default remote address
    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.config.address = addr.into();
        self
    }

    /// Set the dial timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the read/write deadline
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.config.io_timeout = timeout;
        self
    }

    /// Cap incoming frames at `bytes`
    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.config.max_frame_size = Some(bytes);
        self
    }

    /// Enable or disable echoed message id verification
    pub fn verify_message_id(mut self, verify: bool) -> Self {
        self.config.verify_message_id = verify;
        self
    }

    /// Enable or disable outgoing payload logging
    pub fn debug_payloads(mut self, enabled: bool) -> Self {
        self.config.debug_payloads = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
