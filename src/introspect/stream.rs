use serde::{Deserialize, Serialize};

use crate::volume::Volume;

/// Playback stream (sink input) information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkInputInfo {
    /// Stream index
    pub index: u32,
    /// Stream name
    pub name: String,
    /// Application name, when the client announced one
    pub application: Option<String>,
    /// Owning client, if any
    pub client: Option<u32>,
    /// Sink the stream is connected to
    pub sink: u32,
    /// Channel volumes
    pub volume: Volume,
    /// Whether the stream is muted
    pub mute: bool,
}

/// Record stream (source output) information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOutputInfo {
    /// Stream index
    pub index: u32,
    /// Stream name
    pub name: String,
    /// Application name, when the client announced one
    pub application: Option<String>,
    /// Owning client, if any
    pub client: Option<u32>,
    /// Source the stream is connected to
    pub source: u32,
    /// Channel volumes
    pub volume: Volume,
    /// Whether the stream is muted
    pub mute: bool,
}
