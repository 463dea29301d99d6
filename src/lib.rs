//! # Mudcore
//!
//! The world core of a text MUD server: intrusive entity rosters and the
//! pulse-driven update scheduler that walks them.
//!
//! ## Architecture Overview
//!
//! - **Intrusive Lists**: circular doubly-linked lists whose nodes are
//!   embedded in the entities, so one entity sits in several rosters at
//!   once and joins or leaves any of them in O(1)
//! - **World**: a single aggregate owning the entity arenas and the global
//!   rosters, plus the handler primitives that move entities between
//!   collections
//! - **Classes**: per-class ability state as a sum type, ticked by the
//!   player pulse
//! - **Scheduler**: pulse counters firing combat, mobile, regeneration,
//!   decay, area and idle updates, each a removal-safe roster walk
//! - **Snapshots**: serde persistence that rebuilds worlds through the
//!   same factories used live

pub mod config;
pub mod demo;
pub mod list;
pub mod snapshot;
pub mod update;
pub mod world;

pub use config::{GameConfig, IdleConfig, RegenConfig, TickConfig};
pub use list::{List, ListNode, Member, Walk};
pub use snapshot::WorldSnapshot;
pub use update::{PulseKind, PulseReport, Scheduler};
pub use world::{
    AffectKind, AffectSpec, CharId, Character, CharacterTemplate, ClassState, ItemType, ObjId,
    ObjectTemplate, RoomId, Vnum, World,
};

/// Core error type for the MUD core.
#[derive(thiserror::Error, Debug)]
pub enum MudError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// World state is invalid
    #[error("Invalid world state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// A referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration was rejected
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type used throughout the crate.
pub type MudResult<T> = Result<T, MudError>;

/// Version information for the server core.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
