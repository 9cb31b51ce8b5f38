use serde::{Deserialize, Serialize};

use crate::volume::Volume;

use super::{ReplyKind, SubscriptionMask};

/// One outgoing operation.
///
/// The catalogue is open: the engine never interprets a command beyond
/// its [`reply_kind`](Command::reply_kind); adding an operation means
/// adding a variant here, a reply shape, and a thin wrapper on
/// [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Handshake: announce protocol version and present the auth cookie
    Auth {
        /// Client protocol version
        protocol_version: u32,
        /// Authentication cookie bytes (may be empty)
        cookie: Vec<u8>,
    },
    /// Handshake: announce the client name
    SetClientName {
        /// Client name
        name: String,
    },

    /// Query the server state summary
    GetServerInfo,
    /// List all sinks
    GetSinkList,
    /// Query one sink by index
    GetSinkInfo {
        /// Sink index
        index: u32,
    },
    /// Query one sink by name
    GetSinkInfoByName {
        /// Sink name
        name: String,
    },
    /// List all sources
    GetSourceList,
    /// Query one source by index
    GetSourceInfo {
        /// Source index
        index: u32,
    },
    /// Query one source by name
    GetSourceInfoByName {
        /// Source name
        name: String,
    },
    /// List all cards
    GetCardList,
    /// Query one card by index
    GetCardInfo {
        /// Card index
        index: u32,
    },
    /// Query one card by name
    GetCardInfoByName {
        /// Card name
        name: String,
    },
    /// List all clients
    GetClientList,
    /// Query one client by index
    GetClientInfo {
        /// Client index
        index: u32,
    },
    /// List all modules
    GetModuleList,
    /// Query one module by index
    GetModuleInfo {
        /// Module index
        index: u32,
    },
    /// List all playback streams
    GetSinkInputList,
    /// Query one playback stream by index
    GetSinkInputInfo {
        /// Stream index
        index: u32,
    },
    /// List all record streams
    GetSourceOutputList,
    /// Query one record stream by index
    GetSourceOutputInfo {
        /// Stream index
        index: u32,
    },

    /// Set sink volume
    SetSinkVolume {
        /// Sink index
        index: u32,
        /// New channel volumes
        volume: Volume,
    },
    /// Set source volume
    SetSourceVolume {
        /// Source index
        index: u32,
        /// New channel volumes
        volume: Volume,
    },
    /// Set playback stream volume
    SetSinkInputVolume {
        /// Stream index
        index: u32,
        /// New channel volumes
        volume: Volume,
    },
    /// Set record stream volume
    SetSourceOutputVolume {
        /// Stream index
        index: u32,
        /// New channel volumes
        volume: Volume,
    },
    /// Set sink mute state
    SetSinkMute {
        /// Sink index
        index: u32,
        /// Mute state
        mute: bool,
    },
    /// Set source mute state
    SetSourceMute {
        /// Source index
        index: u32,
        /// Mute state
        mute: bool,
    },
    /// Set playback stream mute state
    SetSinkInputMute {
        /// Stream index
        index: u32,
        /// Mute state
        mute: bool,
    },
    /// Set record stream mute state
    SetSourceOutputMute {
        /// Stream index
        index: u32,
        /// Mute state
        mute: bool,
    },
    /// Make the named sink the default
    SetDefaultSink {
        /// Sink name
        name: String,
    },
    /// Make the named source the default
    SetDefaultSource {
        /// Source name
        name: String,
    },
    /// Switch a card to the named profile
    SetCardProfile {
        /// Card index
        index: u32,
        /// Profile name
        profile: String,
    },
    /// Switch a sink to the named port
    SetSinkPort {
        /// Sink index
        index: u32,
        /// Port name
        port: String,
    },
    /// Switch a source to the named port
    SetSourcePort {
        /// Source index
        index: u32,
        /// Port name
        port: String,
    },
    /// Move a playback stream to another sink
    MoveSinkInput {
        /// Stream index
        index: u32,
        /// Destination sink index
        sink: u32,
    },
    /// Move a record stream to another source
    MoveSourceOutput {
        /// Stream index
        index: u32,
        /// Destination source index
        source: u32,
    },
    /// Suspend or resume a sink
    SuspendSink {
        /// Sink index
        index: u32,
        /// Suspend (true) or resume (false)
        suspend: bool,
    },
    /// Suspend or resume a source
    SuspendSource {
        /// Source index
        index: u32,
        /// Suspend (true) or resume (false)
        suspend: bool,
    },
    /// Load a module
    LoadModule {
        /// Module name
        name: String,
        /// Module argument string
        argument: String,
    },
    /// Unload a module
    UnloadModule {
        /// Module index
        index: u32,
    },

    /// Replace the event subscription mask
    Subscribe {
        /// New facility mask
        mask: SubscriptionMask,
    },
}

impl Command {
    /// Reply shape this command's success reply must carry.
    pub fn reply_kind(&self) -> ReplyKind {
        match self {
            Command::Auth { .. } => ReplyKind::AuthAck,
            Command::SetClientName { .. } => ReplyKind::ClientNameAck,
            Command::GetServerInfo => ReplyKind::ServerInfo,
            Command::GetSinkList => ReplyKind::SinkList,
            Command::GetSinkInfo { .. } | Command::GetSinkInfoByName { .. } => ReplyKind::Sink,
            Command::GetSourceList => ReplyKind::SourceList,
            Command::GetSourceInfo { .. } | Command::GetSourceInfoByName { .. } => {
                ReplyKind::Source
            }
            Command::GetCardList => ReplyKind::CardList,
            Command::GetCardInfo { .. } | Command::GetCardInfoByName { .. } => ReplyKind::Card,
            Command::GetClientList => ReplyKind::ClientList,
            Command::GetClientInfo { .. } => ReplyKind::Client,
            Command::GetModuleList => ReplyKind::ModuleList,
            Command::GetModuleInfo { .. } => ReplyKind::Module,
            Command::GetSinkInputList => ReplyKind::SinkInputList,
            Command::GetSinkInputInfo { .. } => ReplyKind::SinkInput,
            Command::GetSourceOutputList => ReplyKind::SourceOutputList,
            Command::GetSourceOutputInfo { .. } => ReplyKind::SourceOutput,
            Command::LoadModule { .. } => ReplyKind::ModuleIndex,
            Command::SetSinkVolume { .. }
            | Command::SetSourceVolume { .. }
            | Command::SetSinkInputVolume { .. }
            | Command::SetSourceOutputVolume { .. }
            | Command::SetSinkMute { .. }
            | Command::SetSourceMute { .. }
            | Command::SetSinkInputMute { .. }
            | Command::SetSourceOutputMute { .. }
            | Command::SetDefaultSink { .. }
            | Command::SetDefaultSource { .. }
            | Command::SetCardProfile { .. }
            | Command::SetSinkPort { .. }
            | Command::SetSourcePort { .. }
            | Command::MoveSinkInput { .. }
            | Command::MoveSourceOutput { .. }
            | Command::SuspendSink { .. }
            | Command::SuspendSource { .. }
            | Command::UnloadModule { .. }
            | Command::Subscribe { .. } => ReplyKind::Ack,
        }
    }

    /// The subscription mask this command installs on success, if it is a
    /// subscribe command.
    pub(crate) fn subscription_mask(&self) -> Option<SubscriptionMask> {
        match self {
            Command::Subscribe { mask } => Some(*mask),
            _ => None,
        }
    }
}
