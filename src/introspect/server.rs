use serde::{Deserialize, Serialize};

/// Server state summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version string
    pub version: String,
    /// User the server runs as
    pub user_name: String,
    /// Host the server runs on
    pub host_name: String,
    /// Name of the current default sink, if any
    pub default_sink: Option<String>,
    /// Name of the current default source, if any
    pub default_source: Option<String>,
    /// Default sample rate
    pub sample_rate: u32,
    /// Default channel count
    pub channels: u8,
}

/// A client connected to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client index
    pub index: u32,
    /// Client name
    pub name: String,
    /// Driver in use, when reported
    pub driver: Option<String>,
    /// Owning module, if any
    pub owner_module: Option<u32>,
}

/// A module loaded into the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Module index
    pub index: u32,
    /// Module name
    pub name: String,
    /// Argument string the module was loaded with
    pub argument: Option<String>,
}
