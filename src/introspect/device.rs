use serde::{Deserialize, Serialize};

use crate::volume::Volume;

/// Device state as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceState {
    /// Device is running and available
    Running,
    /// Device is idle
    Idle,
    /// Device is suspended
    Suspended,
    /// Device state was not reported
    Unknown,
}

/// Device port information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePort {
    /// Port name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Port priority
    pub priority: u32,
    /// Whether the port is currently available
    pub available: bool,
}

/// Complete sink (output device) information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkInfo {
    /// Sink index
    pub index: u32,
    /// Sink name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Current state
    pub state: DeviceState,
    /// Channel volumes
    pub volume: Volume,
    /// Whether the sink is muted
    pub mute: bool,
    /// Owning module, if any
    pub owner_module: Option<u32>,
    /// Name of the monitor source attached to this sink
    pub monitor_source: Option<String>,
    /// Available ports
    pub ports: Vec<DevicePort>,
    /// Currently active port
    pub active_port: Option<String>,
}

/// Complete source (input device) information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Source index
    pub index: u32,
    /// Source name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Current state
    pub state: DeviceState,
    /// Channel volumes
    pub volume: Volume,
    /// Whether the source is muted
    pub mute: bool,
    /// Owning module, if any
    pub owner_module: Option<u32>,
    /// Sink this source monitors, if it is a monitor source
    pub monitor_of_sink: Option<u32>,
    /// Available ports
    pub ports: Vec<DevicePort>,
    /// Currently active port
    pub active_port: Option<String>,
}
