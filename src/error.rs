use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors surfaced by the client engine.
#[derive(Error, Debug)]
pub enum PulseError {
    /// Socket, handshake or authentication failure while establishing
    /// the connection.
    #[error("connection failed: {reason}")]
    Connect {
        /// What went wrong during connect
        reason: String,
    },

    /// Operation invoked outside its valid lifecycle state.
    #[error("{operation} requires a ready connection (state: {state})")]
    State {
        /// Operation that was attempted
        operation: &'static str,
        /// Lifecycle state the connection was in
        state: ConnectionState,
    },

    /// The server explicitly rejected a command.
    #[error("server rejected command: {0}")]
    Operation(ServerErrorCode),

    /// The connection terminated while the operation was outstanding.
    #[error("connection closed")]
    ConnectionClosed,

    /// Malformed or unexpected frame. Always fatal for the connection.
    #[error("protocol violation: {reason}")]
    Protocol {
        /// Nature of the violation
        reason: String,
    },

    /// Invalid volume value passed to a control operation.
    #[error("invalid volume")]
    Volume(#[from] crate::volume::VolumeError),
}

impl PulseError {
    pub(crate) fn connect(reason: impl fmt::Display) -> Self {
        PulseError::Connect {
            reason: reason.to_string(),
        }
    }

    pub(crate) fn protocol(reason: impl fmt::Display) -> Self {
        PulseError::Protocol {
            reason: reason.to_string(),
        }
    }
}

/// Numeric error code carried by a server error frame.
///
/// Values follow the PulseAudio `pa_error_code` enumeration; codes the
/// client does not recognize are preserved verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerErrorCode(pub u32);

impl ServerErrorCode {
    /// Access was denied.
    pub const ACCESS: Self = Self(1);
    /// Invalid argument.
    pub const INVALID: Self = Self(3);
    /// No such entity.
    pub const NO_ENTITY: Self = Self(5);
    /// Authentication cookie was rejected.
    pub const AUTH_KEY: Self = Self(9);
    /// Incompatible protocol version.
    pub const VERSION: Self = Self(17);

    /// Human-readable name for the common codes.
    pub fn description(&self) -> &'static str {
        match self.0 {
            0 => "ok",
            1 => "access denied",
            2 => "unknown command",
            3 => "invalid argument",
            4 => "entity exists",
            5 => "no such entity",
            6 => "connection refused",
            7 => "protocol error",
            8 => "timeout",
            9 => "no authentication key",
            10 => "internal error",
            11 => "connection terminated",
            12 => "entity killed",
            13 => "invalid server",
            15 => "bad state",
            17 => "incompatible protocol version",
            19 => "not supported",
            25 => "input/output error",
            26 => "device or resource busy",
            _ => "unknown error",
        }
    }
}

impl fmt::Display for ServerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description(), self.0)
    }
}
