use std::io;
use thiserror::Error;

/// The primary error type for the `yah3c-lib` library.
#[derive(Error, Debug)]
pub enum H3cError {
    #[error("Malformed frame: expected at least {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    #[error("Truncated packet: declared {declared} bytes, only {available} available")]
    TruncatedPacket { declared: usize, available: usize },

    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("EAP Failure from the authenticator (after logoff: {after_logoff})")]
    ProtocolFailure { after_logoff: bool },

    #[error("EAP payload of {0} bytes does not fit the 16-bit length field")]
    PayloadTooLarge(usize),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Daemonize failed: {0}")]
    Daemonize(String),
}

impl H3cError {
    /// Shorthand for a buffer shorter than a fixed header requires.
    pub fn malformed(expected: usize, actual: usize) -> Self {
        H3cError::MalformedFrame { expected, actual }
    }

    /// Shorthand for a declared length running past the buffer.
    pub fn truncated(declared: usize, available: usize) -> Self {
        H3cError::TruncatedPacket { declared, available }
    }
}

impl From<serde_json::Error> for H3cError {
    fn from(e: serde_json::Error) -> Self {
        H3cError::Config(e.to_string())
    }
}

impl From<nix::Error> for H3cError {
    fn from(e: nix::Error) -> Self {
        H3cError::Daemonize(e.to_string())
    }
}
