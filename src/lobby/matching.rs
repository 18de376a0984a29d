//! Rating compatibility checks between parties and lobbies
//!
//! A party may only join a lobby when its rating is within the threshold of
//! every party already inside it, not just one of them.

use crate::lobby::instance::Lobby;
use crate::rating::RatingFn;
use crate::types::Party;
use crate::utils::ratings_within_tolerance;

/// Default maximum rating gap between two parties
pub const DEFAULT_RATING_THRESHOLD: f64 = 50.0;

/// Whether two parties are within `threshold` rating of each other
pub fn parties_are_compatible(
    party_a: &Party,
    party_b: &Party,
    rating_fn: RatingFn,
    threshold: f64,
) -> bool {
    ratings_within_tolerance(rating_fn(party_a), rating_fn(party_b), threshold)
}

/// Whether `party` is compatible with every party in the lobby.
///
/// An empty lobby accepts any party.
pub fn party_fits_lobby(lobby: &Lobby, party: &Party, rating_fn: RatingFn, threshold: f64) -> bool {
    lobby
        .parties()
        .iter()
        .all(|member| parties_are_compatible(member, party, rating_fn, threshold))
}

/// Check map, queue category and rating eligibility for joining a lobby
pub fn lobby_is_eligible(lobby: &Lobby, party: &Party, rating_fn: RatingFn, threshold: f64) -> bool {
    let correct_map = lobby.map == party.map;
    let correct_size = party.max_size <= lobby.party_size;

    correct_map && correct_size && party_fits_lobby(lobby, party, rating_fn, threshold)
}
