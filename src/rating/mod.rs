//! Party rating (MMR) heuristics
//!
//! Ratings are derived purely from the gear scores of a party's players.
//! A method is selected by its string identifier through the registry in
//! [`method`].

pub mod method;

// Re-export commonly used types
pub use method::{
    average_gear_score_rating, max_gear_score_rating, rating_fn_for, RatingFn, RatingMethod,
};
