//! Lobby formation for the matchmaking engine
//!
//! This module handles lobby state, rating compatibility, party placement
//! and the start/cancel lifecycle of forming lobbies.

pub mod instance;
pub mod lifecycle;
pub mod manager;
pub mod matching;
pub mod placement;

// Re-export commonly used types
pub use instance::{Lobby, LobbyStatus};
pub use lifecycle::{advance_queue_time, evaluate_start_or_cancel, partition_by_status, LobbyPartition};
pub use manager::{
    evaluate_pool, matchmake_party, CategoryQueue, CategoryQueueStats, CategoryTickReport,
    MatchmakingRules, TickOutcome,
};
pub use matching::{lobby_is_eligible, parties_are_compatible, party_fits_lobby};
pub use placement::{attempt_add_party_to_lobby, attempt_merge_party, place_party, PlacementResult};
