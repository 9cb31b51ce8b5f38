//! Typed protocol surface.
//!
//! The engine sequences and multiplexes these values; turning them into
//! wire bytes is the job of a [`FrameCodec`] implementation supplied by
//! the caller.

/// Outgoing commands
pub mod command;
/// Event facilities, masks and records
pub mod event;
/// Frame model and codec contract
pub mod frame;
/// Reply payloads and decode expectations
pub mod reply;

pub use command::Command;
pub use event::{EventKind, EventRecord, Facility, SubscriptionMask};
pub use frame::{CodecError, FrameCodec, Inbound, Tag};
pub use reply::{Reply, ReplyKind};

/// Native protocol version announced during the handshake.
pub const PROTOCOL_VERSION: u32 = 35;
