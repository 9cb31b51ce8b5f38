use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of event facilities a subscription covers.
    ///
    /// Bit values match the server's subscription mask wire encoding.
    /// An empty mask disables event delivery.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SubscriptionMask: u32 {
        /// Sink events
        const SINK = 0x0001;
        /// Source events
        const SOURCE = 0x0002;
        /// Playback stream events
        const SINK_INPUT = 0x0004;
        /// Record stream events
        const SOURCE_OUTPUT = 0x0008;
        /// Module events
        const MODULE = 0x0010;
        /// Client events
        const CLIENT = 0x0020;
        /// Sample cache events
        const SAMPLE_CACHE = 0x0040;
        /// Global server change events
        const SERVER = 0x0080;
        /// Card events
        const CARD = 0x0200;
        /// Every facility
        const ALL = 0x02ff;
    }
}

impl Serialize for SubscriptionMask {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for SubscriptionMask {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(SubscriptionMask::from_bits_truncate(bits))
    }
}

/// Category of server object an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facility {
    /// A sink
    Sink,
    /// A source
    Source,
    /// A playback stream
    SinkInput,
    /// A record stream
    SourceOutput,
    /// A module
    Module,
    /// A client
    Client,
    /// A sample cache entry
    SampleCache,
    /// The server itself
    Server,
    /// A card
    Card,
}

impl Facility {
    /// The mask bit gating delivery of this facility's events
    pub fn mask_bit(self) -> SubscriptionMask {
        match self {
            Facility::Sink => SubscriptionMask::SINK,
            Facility::Source => SubscriptionMask::SOURCE,
            Facility::SinkInput => SubscriptionMask::SINK_INPUT,
            Facility::SourceOutput => SubscriptionMask::SOURCE_OUTPUT,
            Facility::Module => SubscriptionMask::MODULE,
            Facility::Client => SubscriptionMask::CLIENT,
            Facility::SampleCache => SubscriptionMask::SAMPLE_CACHE,
            Facility::Server => SubscriptionMask::SERVER,
            Facility::Card => SubscriptionMask::CARD,
        }
    }
}

/// What happened to the object an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Object appeared
    New,
    /// Object changed
    Changed,
    /// Object was removed
    Removed,
}

/// One server event notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Facility of the affected object
    pub facility: Facility,
    /// Change kind
    pub kind: EventKind,
    /// Index of the affected object
    pub index: u32,
}
