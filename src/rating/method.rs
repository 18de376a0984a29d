//! Rating functions and the identifier registry

use crate::error::{MatchmakingError, Result};
use crate::types::Party;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maps a party to a single skill score
pub type RatingFn = fn(&Party) -> f64;

/// Highest gear score among the party's players
pub fn max_gear_score_rating(party: &Party) -> f64 {
    party
        .players()
        .iter()
        .map(|player| player.gear_score)
        .max()
        .unwrap_or(0) as f64
}

/// Mean gear score of the party's players
pub fn average_gear_score_rating(party: &Party) -> f64 {
    let players = party.players();
    if players.is_empty() {
        return 0.0;
    }

    let total: u64 = players.iter().map(|player| player.gear_score as u64).sum();
    total as f64 / players.len() as f64
}

/// Selectable rating strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RatingMethod {
    #[default]
    #[serde(rename = "max_gs")]
    MaxGearScore,
    #[serde(rename = "avg_gs")]
    AverageGearScore,
}

impl RatingMethod {
    const REGISTRY: [(&'static str, RatingMethod); 2] = [
        ("max_gs", RatingMethod::MaxGearScore),
        ("avg_gs", RatingMethod::AverageGearScore),
    ];

    /// Identifiers accepted by [`RatingMethod::from_str`]
    pub fn available() -> Vec<&'static str> {
        Self::REGISTRY.iter().map(|(id, _)| *id).collect()
    }

    pub fn id(self) -> &'static str {
        match self {
            RatingMethod::MaxGearScore => "max_gs",
            RatingMethod::AverageGearScore => "avg_gs",
        }
    }

    pub fn rating_fn(self) -> RatingFn {
        match self {
            RatingMethod::MaxGearScore => max_gear_score_rating,
            RatingMethod::AverageGearScore => average_gear_score_rating,
        }
    }
}

impl FromStr for RatingMethod {
    type Err = MatchmakingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::REGISTRY
            .iter()
            .find(|(id, _)| *id == s)
            .map(|(_, method)| *method)
            .ok_or_else(|| MatchmakingError::UnsupportedRatingMethod {
                method: s.to_string(),
            })
    }
}

impl std::fmt::Display for RatingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Look up a rating function by identifier
pub fn rating_fn_for(method: &str) -> Result<RatingFn> {
    let method: RatingMethod = method.parse()?;
    Ok(method.rating_fn())
}
