use serde::{Deserialize, Serialize};

use crate::introspect::{
    CardInfo, ClientInfo, ModuleInfo, ServerInfo, SinkInfo, SinkInputInfo, SourceInfo,
    SourceOutputInfo,
};

/// Decoded payload of a successful reply frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply {
    /// Bare acknowledgement
    Ack,
    /// Handshake acknowledgement
    AuthAck {
        /// Protocol version the server speaks
        protocol_version: u32,
    },
    /// Client name acknowledgement
    ClientNameAck {
        /// Index assigned to this client
        client_index: u32,
    },
    /// Server state summary
    ServerInfo(ServerInfo),
    /// All sinks
    SinkList(Vec<SinkInfo>),
    /// One sink
    Sink(SinkInfo),
    /// All sources
    SourceList(Vec<SourceInfo>),
    /// One source
    Source(SourceInfo),
    /// All cards
    CardList(Vec<CardInfo>),
    /// One card
    Card(CardInfo),
    /// All clients
    ClientList(Vec<ClientInfo>),
    /// One client
    Client(ClientInfo),
    /// All modules
    ModuleList(Vec<ModuleInfo>),
    /// One module
    Module(ModuleInfo),
    /// All playback streams
    SinkInputList(Vec<SinkInputInfo>),
    /// One playback stream
    SinkInput(SinkInputInfo),
    /// All record streams
    SourceOutputList(Vec<SourceOutputInfo>),
    /// One record stream
    SourceOutput(SourceOutputInfo),
    /// Index of a freshly loaded module
    ModuleIndex(u32),
}

/// Discriminant of [`Reply`]; the dispatcher's decode expectation for a
/// pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Bare acknowledgement
    Ack,
    /// Handshake acknowledgement
    AuthAck,
    /// Client name acknowledgement
    ClientNameAck,
    /// Server state summary
    ServerInfo,
    /// Sink list
    SinkList,
    /// One sink
    Sink,
    /// Source list
    SourceList,
    /// One source
    Source,
    /// Card list
    CardList,
    /// One card
    Card,
    /// Client list
    ClientList,
    /// One client
    Client,
    /// Module list
    ModuleList,
    /// One module
    Module,
    /// Playback stream list
    SinkInputList,
    /// One playback stream
    SinkInput,
    /// Record stream list
    SourceOutputList,
    /// One record stream
    SourceOutput,
    /// Loaded module index
    ModuleIndex,
}

impl Reply {
    /// The shape of this reply.
    pub fn kind(&self) -> ReplyKind {
        match self {
            Reply::Ack => ReplyKind::Ack,
            Reply::AuthAck { .. } => ReplyKind::AuthAck,
            Reply::ClientNameAck { .. } => ReplyKind::ClientNameAck,
            Reply::ServerInfo(_) => ReplyKind::ServerInfo,
            Reply::SinkList(_) => ReplyKind::SinkList,
            Reply::Sink(_) => ReplyKind::Sink,
            Reply::SourceList(_) => ReplyKind::SourceList,
            Reply::Source(_) => ReplyKind::Source,
            Reply::CardList(_) => ReplyKind::CardList,
            Reply::Card(_) => ReplyKind::Card,
            Reply::ClientList(_) => ReplyKind::ClientList,
            Reply::Client(_) => ReplyKind::Client,
            Reply::ModuleList(_) => ReplyKind::ModuleList,
            Reply::Module(_) => ReplyKind::Module,
            Reply::SinkInputList(_) => ReplyKind::SinkInputList,
            Reply::SinkInput(_) => ReplyKind::SinkInput,
            Reply::SourceOutputList(_) => ReplyKind::SourceOutputList,
            Reply::SourceOutput(_) => ReplyKind::SourceOutput,
            Reply::ModuleIndex(_) => ReplyKind::ModuleIndex,
        }
    }
}
