use std::io;
use thiserror::Error;

/// Custom error type for the SmartBin application
#[derive(Error, Debug)]
pub enum SmartBinError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type alias for the SmartBin application
pub type Result<T> = std::result::Result<T, SmartBinError>;

impl SmartBinError {
    /// Create a storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        SmartBinError::Storage(msg.into())
    }

    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        SmartBinError::Runtime(msg.into())
    }
}

/// Failures of the serial link, one variant per recovery policy.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The host has no usable serial subsystem. Never retried.
    #[error("Serial ports are not supported on this host: {0}")]
    Unsupported(String),

    /// Port missing, busy or permission denied. The user must connect again.
    #[error("Failed to connect to {port}: {reason}")]
    ConnectFailed { port: String, reason: String },

    /// Mid-session read failure. The session is torn down and may be retried once.
    #[error("Read from device failed: {0}")]
    Read(#[source] io::Error),

    /// Write failure. The session is torn down, the command is not retried.
    #[error("Write to device failed: {0}")]
    Write(#[source] io::Error),

    #[error("Not connected to a device")]
    NotConnected,
}

impl TransportError {
    pub fn connect_failed<P: Into<String>, R: ToString>(port: P, reason: R) -> Self {
        TransportError::ConnectFailed {
            port: port.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        TransportError::Unsupported(msg.into())
    }

    /// Whether the runtime may schedule an automatic reconnect after this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Read(_))
    }
}
