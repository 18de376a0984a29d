//! Error types for the matchmaking engine
//!
//! Typed failures are defined with thiserror and carried through anyhow so
//! callers can either bubble them up with `?` or downcast to inspect them.

use crate::types::QueueCategory;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Party cannot be empty")]
    EmptyParty,

    #[error("Party has {size} players but was declared for at most {max_size}")]
    PartyTooLarge { size: usize, max_size: usize },

    #[error("Invalid queue category {value}: must be 1 (solo), 2 (duo) or 3 (trio)")]
    InvalidQueueCategory { value: usize },

    #[error("Invalid lobby: {reason}")]
    InvalidLobby { reason: String },

    #[error("Invalid player: {reason}")]
    InvalidPlayer { reason: String },

    #[error("Unsupported rating method: {method}")]
    UnsupportedRatingMethod { method: String },

    #[error("Invalid merge attempt: party of {party_size} leaves no free slot to merge into {slots}-player parties")]
    InvalidMergeAttempt { party_size: usize, slots: usize },

    #[error("Party queued for {actual} was routed to the {expected} queue")]
    CategoryMismatch {
        expected: QueueCategory,
        actual: QueueCategory,
    },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
