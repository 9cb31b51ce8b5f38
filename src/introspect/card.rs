use serde::{Deserialize, Serialize};

/// A profile a card can switch to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardProfile {
    /// Profile name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Number of sinks the profile provides
    pub sinks: u32,
    /// Number of sources the profile provides
    pub sources: u32,
    /// Whether the profile is currently available
    pub available: bool,
}

/// Complete card information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardInfo {
    /// Card index
    pub index: u32,
    /// Card name
    pub name: String,
    /// Driver in use, when reported
    pub driver: Option<String>,
    /// Owning module, if any
    pub owner_module: Option<u32>,
    /// Profiles the card supports
    pub profiles: Vec<CardProfile>,
    /// Currently active profile
    pub active_profile: Option<String>,
}

impl CardInfo {
    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Option<&CardProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }
}
