//! Lobby instance and its lifecycle state
//!
//! A lobby collects parties queuing for the same map and queue category
//! until it either fills up or runs out of queue time.

use crate::error::{MatchmakingError, Result};
use crate::types::{GameMap, LobbyId, Party, QueueCategory};
use crate::utils::generate_lobby_id;
use serde::{Deserialize, Serialize};

/// Possible states of a lobby
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LobbyStatus {
    /// Lobby is still accepting parties
    Filling,
    /// Lobby game has started (terminal state)
    Started,
    /// Lobby timed out without any complete party (terminal state)
    Canceled,
}

impl std::fmt::Display for LobbyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LobbyStatus::Filling => write!(f, "filling"),
            LobbyStatus::Started => write!(f, "started"),
            LobbyStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// A game lobby being assembled from parties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LobbyRecord")]
pub struct Lobby {
    pub(crate) id: LobbyId,
    pub(crate) parties: Vec<Party>,
    pub(crate) map: GameMap,
    pub(crate) party_size: QueueCategory,
    pub(crate) max_players: usize,
    pub queue_time: u64,
    pub(crate) status: LobbyStatus,
}

/// Wire form of a lobby, checked against the lobby invariants on the way in
#[derive(Deserialize)]
struct LobbyRecord {
    id: LobbyId,
    parties: Vec<Party>,
    map: GameMap,
    party_size: QueueCategory,
    max_players: usize,
    queue_time: u64,
    status: LobbyStatus,
}

impl TryFrom<LobbyRecord> for Lobby {
    type Error = MatchmakingError;

    fn try_from(record: LobbyRecord) -> std::result::Result<Self, Self::Error> {
        if record.max_players != record.party_size.max_players() {
            return Err(MatchmakingError::InvalidLobby {
                reason: format!(
                    "{} lobby must hold {} players, not {}",
                    record.party_size,
                    record.party_size.max_players(),
                    record.max_players
                ),
            });
        }

        let lobby = Lobby {
            id: record.id,
            parties: record.parties,
            map: record.map,
            party_size: record.party_size,
            max_players: record.max_players,
            queue_time: record.queue_time,
            status: record.status,
        };
        lobby.check_parties()?;

        let slots = lobby.party_slots();
        match lobby.status {
            LobbyStatus::Filling => {}
            LobbyStatus::Started => {
                if lobby.is_empty() || !lobby.parties.iter().all(|p| p.is_complete(slots)) {
                    return Err(MatchmakingError::InvalidLobby {
                        reason: "started lobby must hold only complete parties".to_string(),
                    });
                }
            }
            LobbyStatus::Canceled => {
                if !lobby.is_empty() {
                    return Err(MatchmakingError::InvalidLobby {
                        reason: "canceled lobby must be empty".to_string(),
                    });
                }
            }
        }

        Ok(lobby)
    }
}

impl Lobby {
    /// Create an empty filling lobby for a queue category given as a number.
    ///
    /// Only 1 (solo), 2 (duo) and 3 (trio) are accepted.
    pub fn new(party_size: usize, map: GameMap) -> Result<Self> {
        let category = QueueCategory::try_from(party_size)?;
        Ok(Self::for_category(category, map))
    }

    /// Create an empty filling lobby for a known queue category
    pub fn for_category(party_size: QueueCategory, map: GameMap) -> Self {
        Self {
            id: generate_lobby_id(),
            parties: Vec::new(),
            map,
            party_size,
            max_players: party_size.max_players(),
            queue_time: 0,
            status: LobbyStatus::Filling,
        }
    }

    /// Create a filling lobby around its first party.
    ///
    /// The lobby takes the party's map and declared queue category.
    pub fn seeded(party: Party) -> Self {
        let mut lobby = Self::for_category(party.max_size, party.map);
        lobby.parties.push(party);
        lobby
    }

    /// Rebuild a filling lobby from existing parties.
    ///
    /// Every party must share the lobby's map, be declared for this queue
    /// category or a smaller one, fit the per-party slot count, and together
    /// stay within the lobby's capacity.
    pub fn with_parties(party_size: usize, map: GameMap, parties: Vec<Party>) -> Result<Self> {
        let mut lobby = Self::new(party_size, map)?;
        lobby.parties = parties;
        lobby.check_parties()?;
        Ok(lobby)
    }

    fn check_parties(&self) -> std::result::Result<(), MatchmakingError> {
        let slots = self.party_slots();

        for party in &self.parties {
            if party.map != self.map {
                return Err(MatchmakingError::InvalidLobby {
                    reason: format!("party for {} cannot join a {} lobby", party.map, self.map),
                });
            }
            if party.max_size > self.party_size {
                return Err(MatchmakingError::InvalidLobby {
                    reason: format!(
                        "{} party cannot join a {} lobby",
                        party.max_size, self.party_size
                    ),
                });
            }
            if party.size() > slots {
                return Err(MatchmakingError::InvalidLobby {
                    reason: format!("party of {} exceeds {}-player slots", party.size(), slots),
                });
            }
        }

        if self.current_player_count() > self.max_players {
            return Err(MatchmakingError::InvalidLobby {
                reason: format!(
                    "{} players exceed capacity {}",
                    self.current_player_count(),
                    self.max_players
                ),
            });
        }

        Ok(())
    }

    pub fn id(&self) -> LobbyId {
        self.id
    }

    pub fn map(&self) -> GameMap {
        self.map
    }

    /// Queue category of the lobby
    pub fn party_size(&self) -> QueueCategory {
        self.party_size
    }

    /// Fixed capacity for the lobby's queue category
    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn status(&self) -> LobbyStatus {
        self.status
    }

    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    /// Players needed for a party in this lobby to be complete
    pub fn party_slots(&self) -> usize {
        self.party_size.party_slots()
    }

    /// Total players across all parties
    pub fn current_player_count(&self) -> usize {
        self.parties.iter().map(Party::size).sum()
    }

    /// Players belonging to complete parties only
    pub fn full_player_count(&self) -> usize {
        let slots = self.party_slots();
        self.parties
            .iter()
            .filter(|party| party.is_complete(slots))
            .map(Party::size)
            .sum()
    }

    /// Whether complete parties fill the lobby to capacity
    pub fn is_full(&self) -> bool {
        self.full_player_count() == self.max_players
    }

    /// Whether the lobby has waited at least `max_queue_time` seconds
    pub fn is_timed_out(&self, max_queue_time: u64) -> bool {
        self.queue_time >= max_queue_time
    }

    pub fn is_filling(&self) -> bool {
        self.status == LobbyStatus::Filling
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }

    /// Remove and return every party that is not complete, keeping order
    pub(crate) fn drain_incomplete_parties(&mut self) -> Vec<Party> {
        let slots = self.party_slots();
        let (complete, incomplete): (Vec<Party>, Vec<Party>) = std::mem::take(&mut self.parties)
            .into_iter()
            .partition(|party| party.is_complete(slots));
        self.parties = complete;
        incomplete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Job, Player};

    fn party_of(size: usize, max_size: usize) -> Party {
        let players = (0..size)
            .map(|_| Player::new(Job::Cleric, 5, 100).unwrap())
            .collect();
        Party::new(players, GameMap::GoblinCaves, max_size).unwrap()
    }

    #[test]
    fn test_lobby_instance_creation() {
        let lobby = Lobby::new(2, GameMap::IceCavern).unwrap();

        assert_eq!(lobby.status, LobbyStatus::Filling);
        assert_eq!(lobby.party_size, QueueCategory::Duo);
        assert_eq!(lobby.max_players, 14);
        assert_eq!(lobby.queue_time, 0);
        assert!(lobby.is_empty());
        assert!(!lobby.is_full());
    }

    #[test]
    fn test_lobby_rejects_invalid_category() {
        for size in [0, 4, 10] {
            let err = Lobby::new(size, GameMap::IceCavern).unwrap_err();
            assert_eq!(
                err.downcast_ref::<MatchmakingError>(),
                Some(&MatchmakingError::InvalidQueueCategory { value: size })
            );
        }
    }

    #[test]
    fn test_seeded_lobby_takes_party_attributes() {
        let lobby = Lobby::seeded(party_of(1, 3));

        assert_eq!(lobby.map, GameMap::GoblinCaves);
        assert_eq!(lobby.party_size, QueueCategory::Trio);
        assert_eq!(lobby.max_players, 15);
        assert_eq!(lobby.parties().len(), 1);
        assert_eq!(lobby.current_player_count(), 1);
        assert_eq!(lobby.full_player_count(), 0);
    }

    #[test]
    fn test_player_counts() {
        let mut lobby = Lobby::new(3, GameMap::GoblinCaves).unwrap();
        lobby.parties.push(party_of(3, 3));
        lobby.parties.push(party_of(2, 3));

        assert_eq!(lobby.current_player_count(), 5);
        assert_eq!(lobby.full_player_count(), 3);
    }

    #[test]
    fn test_drain_incomplete_parties_keeps_order() {
        let mut lobby = Lobby::new(2, GameMap::GoblinCaves).unwrap();
        lobby.parties.push(party_of(1, 2));
        lobby.parties.push(party_of(2, 2));
        lobby.parties.push(party_of(1, 2));
        lobby.parties.push(party_of(2, 2));

        let dropped = lobby.drain_incomplete_parties();

        assert_eq!(dropped.len(), 2);
        assert!(dropped.iter().all(|p| p.size() == 1));
        assert_eq!(lobby.parties().len(), 2);
        assert!(lobby.parties().iter().all(|p| p.size() == 2));
    }

    #[test]
    fn test_with_parties_validation() {
        let lobby = Lobby::with_parties(3, GameMap::GoblinCaves, vec![party_of(3, 3), party_of(2, 3)])
            .unwrap();
        assert_eq!(lobby.current_player_count(), 5);

        // Map mismatch
        let other_map = Party::new(
            vec![Player::new(Job::Rogue, 5, 100).unwrap()],
            GameMap::IceCavern,
            1,
        )
        .unwrap();
        assert!(Lobby::with_parties(1, GameMap::GoblinCaves, vec![other_map]).is_err());

        // Party larger than the slot count
        assert!(Lobby::with_parties(1, GameMap::GoblinCaves, vec![party_of(2, 2)]).is_err());

        // Over capacity
        let solos = (0..11).map(|_| party_of(1, 1)).collect();
        assert!(Lobby::with_parties(1, GameMap::GoblinCaves, solos).is_err());

        // Declared for a larger queue
        assert!(Lobby::with_parties(2, GameMap::GoblinCaves, vec![party_of(1, 3)]).is_err());
    }

    #[test]
    fn test_deserialization_is_validated() {
        let lobby = Lobby::with_parties(2, GameMap::GoblinCaves, vec![party_of(2, 2), party_of(1, 2)])
            .unwrap();
        let json = serde_json::to_value(&lobby).unwrap();
        assert_eq!(serde_json::from_value::<Lobby>(json.clone()).unwrap(), lobby);

        let mut wrong_capacity = json.clone();
        wrong_capacity["max_players"] = serde_json::json!(20);
        assert!(serde_json::from_value::<Lobby>(wrong_capacity).is_err());

        // Started lobbies never keep incomplete parties
        let mut started = json.clone();
        started["status"] = serde_json::json!("started");
        assert!(serde_json::from_value::<Lobby>(started).is_err());

        let mut canceled = json;
        canceled["status"] = serde_json::json!("canceled");
        assert!(serde_json::from_value::<Lobby>(canceled).is_err());
    }

    #[test]
    fn test_timeout_boundary() {
        let mut lobby = Lobby::new(1, GameMap::GoblinCaves).unwrap();
        lobby.queue_time = 119;
        assert!(!lobby.is_timed_out(120));
        lobby.queue_time = 120;
        assert!(lobby.is_timed_out(120));
    }
}
