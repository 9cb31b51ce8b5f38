use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ServerErrorCode;

use super::{Command, EventRecord, Reply};

/// Correlation tag linking a request frame to its reply frame.
///
/// Monotonically increasing, unique for the lifetime of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag(pub u32);

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Successful reply to the request carrying the same tag
    Reply {
        /// Correlation tag of the request
        tag: Tag,
        /// Decoded payload
        reply: Reply,
    },
    /// Server rejection of the request carrying the same tag
    ServerError {
        /// Correlation tag of the request
        tag: Tag,
        /// Server error code
        code: ServerErrorCode,
    },
    /// Unsolicited event notification
    Event(EventRecord),
}

/// Codec failures.
#[derive(Error, Debug)]
pub enum CodecError {
    /// A command could not be encoded
    #[error("cannot encode command: {0}")]
    Encode(String),
    /// Inbound bytes do not form a valid frame
    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// Wire format collaborator.
///
/// Turns tagged commands into byte frames and inbound bytes into decoded
/// frames. The engine treats the format as opaque: framing, field layout
/// and volume quantization all live behind this trait.
pub trait FrameCodec: Send {
    /// Encode one tagged command into a complete wire frame.
    ///
    /// # Errors
    /// Returns [`CodecError::Encode`] when the command cannot be
    /// represented; the engine fails that single request and the
    /// connection stays usable.
    fn encode(&self, tag: Tag, command: &Command) -> Result<Vec<u8>, CodecError>;

    /// Decode at most one complete frame from the front of `buf`,
    /// removing the consumed bytes. `Ok(None)` means more bytes are
    /// needed.
    ///
    /// # Errors
    /// Returns [`CodecError::Malformed`] on undecodable input; the engine
    /// treats this as a fatal protocol violation.
    fn decode(&self, buf: &mut Vec<u8>) -> Result<Option<Inbound>, CodecError>;
}
