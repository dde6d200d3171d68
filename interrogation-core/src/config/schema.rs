//! Catalog schema types
//!
//! The content catalog is loaded once at process start and never mutated.
//! These types are deserialized from YAML catalog files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of penalties offered per interview unless configured otherwise.
pub const DEFAULT_PENALTY_COUNT: usize = 3;

/// Number of suspect backgrounds offered per interview unless configured otherwise.
pub const DEFAULT_BACKGROUND_OPTIONS: usize = 3;

/// Number of symbols in a generated interference pattern unless configured otherwise.
pub const DEFAULT_INTERFERENCE_LENGTH: usize = 6;

// ============================================================================
// Top-Level Catalog
// ============================================================================

/// Root of a catalog file: game content plus the session-code word list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogConfig {
    /// Game content and rules
    pub game: GameConfiguration,

    /// Word list used to build session codes
    pub ids: IdGeneration,
}

/// Immutable game content: packets, penalties, backgrounds and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GameConfiguration {
    /// Interview length in seconds, counted from the moment it starts
    pub duration: u64,

    /// How many distinct penalties are offered per interview
    #[serde(default = "default_penalty_count")]
    pub penalty_count: usize,

    /// How many distinct suspect backgrounds are offered per interview
    #[serde(default = "default_background_options")]
    pub background_options: usize,

    /// Number of symbols in each interference pattern
    #[serde(default = "default_interference_length")]
    pub interference_length: usize,

    /// The single human role, usable with any packet
    pub human_role: SuspectRole,

    /// Penalty descriptions
    pub penalties: Vec<String>,

    /// Suspect background descriptions
    pub suspect_backgrounds: Vec<String>,

    /// Themed packets of robot roles
    pub packets: Vec<Packet>,
}

impl GameConfiguration {
    /// Returns the interview length as a [`Duration`].
    #[must_use]
    pub const fn interview_duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }
}

const fn default_penalty_count() -> usize {
    DEFAULT_PENALTY_COUNT
}

const fn default_background_options() -> usize {
    DEFAULT_BACKGROUND_OPTIONS
}

const fn default_interference_length() -> usize {
    DEFAULT_INTERFERENCE_LENGTH
}

/// Word list for session-code generation.
///
/// A code is `word_count` distinct words concatenated, e.g. `RedFoxJump`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IdGeneration {
    /// Candidate words
    pub words: Vec<String>,

    /// How many words make up one code
    pub word_count: usize,
}

// ============================================================================
// Packets and Roles
// ============================================================================

/// A themed bundle of candidate robot roles.
///
/// The human role is catalog-global and never listed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Packet {
    /// Display name
    pub name: String,

    /// Flavour text shown during packet selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Robot roles the suspect may be dealt with this packet
    pub roles: Vec<SuspectRole>,
}

/// The hidden identity dealt to the suspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SuspectRole {
    /// Role type
    #[serde(rename = "type")]
    pub role_type: SuspectRoleType,

    /// Narrative fault the suspect must act out
    #[serde(default)]
    pub fault: String,

    /// Behavioural traits
    #[serde(default)]
    pub traits: Vec<String>,
}

/// Role type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspectRoleType {
    /// A human suspect
    Human,
    /// A robot following its fault and traits
    Robot,
    /// A robot that may kill the interviewer
    ViolentRobot,
}

impl SuspectRoleType {
    /// Returns `true` for every robot variant.
    #[must_use]
    pub const fn is_robot(self) -> bool {
        !matches!(self, Self::Human)
    }
}

impl std::fmt::Display for SuspectRoleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Human => "human",
            Self::Robot => "robot",
            Self::ViolentRobot => "violent_robot",
        };
        f.write_str(name)
    }
}
