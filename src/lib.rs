//! Pulsewire - native client engine for the PulseAudio control protocol.
//!
//! A single-threaded cooperative client for the sound server's control
//! surface: connection management, server and device enumeration, volume
//! and mute control, and live event subscription. The engine owns the
//! socket through one reactor task; callers get a non-blocking,
//! cancellable [`Connection`] API.
//!
//! The byte-level wire format is an external collaborator: implement
//! [`FrameCodec`] (or take one from a companion crate) and hand it to
//! [`Connection::connect`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pulsewire::{ClientConfig, Connection, SubscriptionMask};
//! # use pulsewire::{proto::{CodecError, Command, Inbound, Tag}, FrameCodec};
//! # struct MyCodec;
//! # impl FrameCodec for MyCodec {
//! #     fn encode(&self, _: Tag, _: &Command) -> Result<Vec<u8>, CodecError> { unimplemented!() }
//! #     fn decode(&self, _: &mut Vec<u8>) -> Result<Option<Inbound>, CodecError> { unimplemented!() }
//! # }
//! use futures::StreamExt;
//!
//! # async fn demo() -> Result<(), pulsewire::PulseError> {
//! let connection =
//!     Connection::connect(ClientConfig::new("my-mixer"), Box::new(MyCodec)).await?;
//!
//! for sink in connection.sink_list().await? {
//!     println!("{}: {}", sink.index, sink.description);
//! }
//!
//! let mut events = connection.subscribe_events(SubscriptionMask::SINK).await?;
//! while let Some(event) = events.next().await {
//!     println!("{:?}", event?);
//! }
//! # Ok(())
//! # }
//! ```

/// Client configuration and endpoint resolution.
pub mod config;

/// Connection lifecycle and the operation surface.
pub mod connection;

mod engine;

/// Error taxonomy.
pub mod error;

/// Typed records returned by server queries.
pub mod introspect;

/// Typed protocol surface and the codec contract.
pub mod proto;

/// Channel volume model.
pub mod volume;

pub use config::ClientConfig;
pub use connection::{Connection, ConnectionState};
pub use engine::events::EventListener;
pub use error::{PulseError, ServerErrorCode};
pub use proto::{
    EventKind, EventRecord, Facility, FrameCodec, SubscriptionMask,
};
pub use volume::Volume;
