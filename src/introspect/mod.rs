//! Typed records for server object queries.
//!
//! These are the values the query operations on
//! [`Connection`](crate::Connection) resolve to. They carry what the
//! control surface needs; sample-format and latency details of the data
//! plane are out of scope.

/// Sink and source device records
pub mod device;
/// Playback and record stream records
pub mod stream;
/// Card and profile records
pub mod card;
/// Server, client and module records
pub mod server;

pub use card::{CardInfo, CardProfile};
pub use device::{DevicePort, DeviceState, SinkInfo, SourceInfo};
pub use server::{ClientInfo, ModuleInfo, ServerInfo};
pub use stream::{SinkInputInfo, SourceOutputInfo};
