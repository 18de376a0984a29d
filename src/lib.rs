//! Crypt Queue - party matchmaking for dungeon crawler lobbies
//!
//! Parties queue for solo, duo or trio lobbies on one of several maps. Each
//! queue category is matchmade by its own worker: parties are placed into
//! the first compatible lobby by gear score rating, and lobbies start once
//! full or cancel once their queue time runs out.

pub mod config;
pub mod error;
pub mod lobby;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod simulation;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use lobby::{CategoryQueue, Lobby, LobbyStatus, MatchmakingRules};
pub use rating::RatingMethod;
pub use simulation::{MatchmakingReport, Simulation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
