//! Common types used throughout the matchmaking engine

use crate::error::{MatchmakingError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for lobbies
pub type LobbyId = Uuid;

/// Character class a player queues with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Job {
    Bard,
    Barbarian,
    Cleric,
    Druid,
    Fighter,
    Ranger,
    Rogue,
    Warlock,
    Wizard,
}

impl Job {
    pub const ALL: [Job; 9] = [
        Job::Bard,
        Job::Barbarian,
        Job::Cleric,
        Job::Druid,
        Job::Fighter,
        Job::Ranger,
        Job::Rogue,
        Job::Warlock,
        Job::Wizard,
    ];
}

/// Map a party is queuing for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMap {
    GoblinCaves,
    HowlingCrypts,
    IceCavern,
}

impl GameMap {
    pub const ALL: [GameMap; 3] = [GameMap::GoblinCaves, GameMap::HowlingCrypts, GameMap::IceCavern];
}

impl std::fmt::Display for GameMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMap::GoblinCaves => write!(f, "goblin_caves"),
            GameMap::HowlingCrypts => write!(f, "howling_crypts"),
            GameMap::IceCavern => write!(f, "ice_cavern"),
        }
    }
}

/// Queue type a party or lobby belongs to.
///
/// The category number doubles as the per-party player target inside a
/// lobby: a trio lobby holds parties of up to three players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueCategory {
    Solo,
    Duo,
    Trio,
}

impl QueueCategory {
    pub const ALL: [QueueCategory; 3] = [QueueCategory::Solo, QueueCategory::Duo, QueueCategory::Trio];

    /// Number of players a complete party holds in this queue
    pub fn party_slots(self) -> usize {
        match self {
            QueueCategory::Solo => 1,
            QueueCategory::Duo => 2,
            QueueCategory::Trio => 3,
        }
    }

    /// Lobby capacity for this queue
    pub fn max_players(self) -> usize {
        match self {
            QueueCategory::Solo => 10,
            QueueCategory::Duo => 14,
            QueueCategory::Trio => 15,
        }
    }

    /// Label used for metrics and logs
    pub fn as_str(self) -> &'static str {
        match self {
            QueueCategory::Solo => "solo",
            QueueCategory::Duo => "duo",
            QueueCategory::Trio => "trio",
        }
    }
}

impl TryFrom<usize> for QueueCategory {
    type Error = MatchmakingError;

    fn try_from(value: usize) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(QueueCategory::Solo),
            2 => Ok(QueueCategory::Duo),
            3 => Ok(QueueCategory::Trio),
            _ => Err(MatchmakingError::InvalidQueueCategory { value }),
        }
    }
}

impl std::fmt::Display for QueueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single queued player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub job: Job,
    pub level: u32,
    pub gear_score: u32,
}

impl Player {
    /// Create a player, rejecting non-positive level or gear score
    pub fn new(job: Job, level: u32, gear_score: u32) -> Result<Self> {
        if level == 0 {
            return Err(MatchmakingError::InvalidPlayer {
                reason: "level must be positive".to_string(),
            }
            .into());
        }
        if gear_score == 0 {
            return Err(MatchmakingError::InvalidPlayer {
                reason: "gear score must be positive".to_string(),
            }
            .into());
        }

        Ok(Self {
            job,
            level,
            gear_score,
        })
    }
}

/// Players queuing together for one map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PartyRecord")]
pub struct Party {
    players: Vec<Player>,
    pub(crate) map: GameMap,
    pub(crate) max_size: QueueCategory,
}

/// Wire form of a party, checked by [`Party::validated`] on the way in
#[derive(Deserialize)]
struct PartyRecord {
    players: Vec<Player>,
    map: GameMap,
    max_size: QueueCategory,
}

impl TryFrom<PartyRecord> for Party {
    type Error = MatchmakingError;

    fn try_from(record: PartyRecord) -> std::result::Result<Self, Self::Error> {
        Party::validated(record.players, record.map, record.max_size)
    }
}

impl Party {
    /// Create a party of one to three players.
    ///
    /// Fails when `players` is empty, when `max_size` is not a valid queue
    /// category, or when there are more players than `max_size` allows.
    pub fn new(players: Vec<Player>, map: GameMap, max_size: usize) -> Result<Self> {
        let max_size = QueueCategory::try_from(max_size)?;
        Ok(Self::validated(players, map, max_size)?)
    }

    fn validated(
        players: Vec<Player>,
        map: GameMap,
        max_size: QueueCategory,
    ) -> std::result::Result<Self, MatchmakingError> {
        if players.is_empty() {
            return Err(MatchmakingError::EmptyParty);
        }
        if players.len() > max_size.party_slots() {
            return Err(MatchmakingError::PartyTooLarge {
                size: players.len(),
                max_size: max_size.party_slots(),
            });
        }

        Ok(Self {
            players,
            map,
            max_size,
        })
    }

    pub fn map(&self) -> GameMap {
        self.map
    }

    /// Queue category the party declared
    pub fn max_size(&self) -> QueueCategory {
        self.max_size
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Number of players in the party
    pub fn size(&self) -> usize {
        self.players.len()
    }

    /// Whether the party holds exactly `target` players
    pub fn is_complete(&self, target: usize) -> bool {
        self.size() == target
    }

    /// Append another party's players after this party's own.
    ///
    /// The merged party is re-declared for `category`, the queue of the lobby
    /// it was formed in; callers keep the size within its slots.
    pub(crate) fn absorb(&mut self, other: Party, category: QueueCategory) {
        self.players.extend(other.players);
        self.max_size = category;
    }
}
