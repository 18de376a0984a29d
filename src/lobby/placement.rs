//! Placing incoming parties into forming lobbies
//!
//! Placement is greedy first-fit: lobbies are tried in pool order and the
//! first one that accepts the party wins. A party nobody accepts seeds a new
//! lobby at the end of the pool.

use crate::error::{MatchmakingError, Result};
use crate::lobby::instance::Lobby;
use crate::lobby::matching::lobby_is_eligible;
use crate::rating::RatingFn;
use crate::types::Party;
use tracing::debug;

/// Outcome of offering a party to a lobby
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementResult {
    /// The lobby took ownership of the party
    Accepted,
    /// The lobby declined; the party is handed back unchanged
    Rejected(Party),
}

impl PlacementResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PlacementResult::Accepted)
    }
}

/// Fold an incomplete party into the first lobby party with enough free slots.
///
/// Existing players keep their position and the new players are appended.
/// Offering a party that is already complete is a caller bug and fails with
/// [`MatchmakingError::InvalidMergeAttempt`].
pub fn attempt_merge_party(lobby: &mut Lobby, new_party: Party) -> Result<PlacementResult> {
    let slots = lobby.party_slots();
    if new_party.size() >= slots {
        return Err(MatchmakingError::InvalidMergeAttempt {
            party_size: new_party.size(),
            slots,
        }
        .into());
    }

    let lobby_id = lobby.id;
    let category = lobby.party_size;
    match lobby
        .parties
        .iter_mut()
        .find(|existing| existing.size() + new_party.size() <= slots)
    {
        Some(existing) => {
            existing.absorb(new_party, category);
            debug!(
                "Merged party into lobby {} - merged party size: {}/{}",
                lobby_id,
                existing.size(),
                slots
            );
            Ok(PlacementResult::Accepted)
        }
        None => Ok(PlacementResult::Rejected(new_party)),
    }
}

/// Offer a party to a single lobby.
///
/// The party must be eligible for the lobby and fit within its capacity.
/// Complete parties are added as their own entry, incomplete ones are merged.
pub fn attempt_add_party_to_lobby(
    lobby: &mut Lobby,
    party: Party,
    rating_fn: RatingFn,
    threshold: f64,
) -> Result<PlacementResult> {
    if !lobby.is_filling() {
        return Ok(PlacementResult::Rejected(party));
    }

    if !lobby_is_eligible(lobby, &party, rating_fn, threshold) {
        return Ok(PlacementResult::Rejected(party));
    }

    if lobby.current_player_count() + party.size() > lobby.max_players {
        debug!(
            "Lobby {} at capacity - current: {}, incoming: {}, max: {}",
            lobby.id,
            lobby.current_player_count(),
            party.size(),
            lobby.max_players
        );
        return Ok(PlacementResult::Rejected(party));
    }

    if party.is_complete(lobby.party_slots()) {
        lobby.parties.push(party);
        debug!(
            "Added complete party to lobby {} - players: {}/{}",
            lobby.id,
            lobby.current_player_count(),
            lobby.max_players
        );
        return Ok(PlacementResult::Accepted);
    }

    attempt_merge_party(lobby, party)
}

/// Place a party into the first lobby that accepts it, or open a new lobby.
///
/// Returns the updated pool. A new lobby is always appended at the end so
/// older lobbies keep their priority.
pub fn place_party(
    mut lobbies: Vec<Lobby>,
    party: Party,
    rating_fn: RatingFn,
    threshold: f64,
) -> Result<Vec<Lobby>> {
    let mut pending = Some(party);

    for lobby in lobbies.iter_mut() {
        let Some(candidate) = pending.take() else {
            break;
        };

        match attempt_add_party_to_lobby(lobby, candidate, rating_fn, threshold)? {
            PlacementResult::Accepted => {
                debug!("Party placed in existing lobby {}", lobby.id);
            }
            PlacementResult::Rejected(party) => pending = Some(party),
        }
    }

    if let Some(party) = pending {
        let lobby = Lobby::seeded(party);
        debug!(
            "No lobby accepted party, opened {} {} lobby {}",
            lobby.party_size, lobby.map, lobby.id
        );
        lobbies.push(lobby);
    }

    Ok(lobbies)
}
