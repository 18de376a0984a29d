//! Random party generation for simulated queues

use crate::config::SimulationSettings;
use crate::error::{MatchmakingError, Result};
use crate::types::{GameMap, Job, Party, Player, QueueCategory};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Half-open ranges players are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerRanges {
    pub min_level: u32,
    pub max_level: u32,
    pub min_gear_score: u32,
    pub max_gear_score: u32,
}

impl Default for PlayerRanges {
    fn default() -> Self {
        Self {
            min_level: 1,
            max_level: 300,
            min_gear_score: 1,
            max_gear_score: 400,
        }
    }
}

/// Seedable generator of players and parties
#[derive(Debug, Clone)]
pub struct PartyGenerator {
    rng: StdRng,
    ranges: PlayerRanges,
}

impl PartyGenerator {
    /// Create a generator; the same seed always yields the same parties
    pub fn new(seed: Option<u64>, ranges: PlayerRanges) -> Result<Self> {
        if ranges.min_level == 0 || ranges.min_level >= ranges.max_level {
            return Err(MatchmakingError::ConfigurationError {
                message: format!(
                    "Invalid level range: {}..{}",
                    ranges.min_level, ranges.max_level
                ),
            }
            .into());
        }
        if ranges.min_gear_score == 0 || ranges.min_gear_score >= ranges.max_gear_score {
            return Err(MatchmakingError::ConfigurationError {
                message: format!(
                    "Invalid gear score range: {}..{}",
                    ranges.min_gear_score, ranges.max_gear_score
                ),
            }
            .into());
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self { rng, ranges })
    }

    pub fn from_settings(settings: &SimulationSettings) -> Result<Self> {
        Self::new(
            settings.seed,
            PlayerRanges {
                min_level: settings.min_level,
                max_level: settings.max_level,
                min_gear_score: settings.min_gear_score,
                max_gear_score: settings.max_gear_score,
            },
        )
    }

    /// Draw a player with a uniform job, level and gear score
    pub fn generate_player(&mut self) -> Result<Player> {
        let gear_score = self
            .rng
            .random_range(self.ranges.min_gear_score..self.ranges.max_gear_score);
        let level = self
            .rng
            .random_range(self.ranges.min_level..self.ranges.max_level);
        let job = Job::ALL[self.rng.random_range(0..Job::ALL.len())];

        Player::new(job, level, gear_score)
    }

    /// Draw a party for a random map.
    ///
    /// Without `num_players` the player count is drawn from `1..=max_size`.
    /// The declared queue size is drawn from `num_players..=3`, so a duo may
    /// queue for trios but never for solos.
    pub fn generate_party(&mut self, num_players: Option<usize>, max_size: usize) -> Result<Party> {
        let max_size = QueueCategory::try_from(max_size)?.party_slots();
        let num_players = match num_players {
            Some(count) => QueueCategory::try_from(count)?.party_slots(),
            None => self.rng.random_range(1..=max_size),
        };

        let players = (0..num_players)
            .map(|_| self.generate_player())
            .collect::<Result<Vec<_>>>()?;
        let map = GameMap::ALL[self.rng.random_range(0..GameMap::ALL.len())];
        let queue_size = self
            .rng
            .random_range(num_players..=QueueCategory::Trio.party_slots());

        Party::new(players, map, queue_size)
    }

    /// Draw `count` parties of one to three players
    pub fn generate_parties(&mut self, count: usize) -> Result<Vec<Party>> {
        (0..count)
            .map(|_| self.generate_party(None, QueueCategory::Trio.party_slots()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_player_within_ranges() {
        let ranges = PlayerRanges {
            min_level: 20,
            max_level: 100,
            min_gear_score: 25,
            max_gear_score: 124,
        };
        let mut generator = PartyGenerator::new(Some(1), ranges).unwrap();

        for _ in 0..200 {
            let player = generator.generate_player().unwrap();
            assert!((20..100).contains(&player.level));
            assert!((25..124).contains(&player.gear_score));
        }
    }

    #[test]
    fn test_generate_party_respects_max_size() {
        let mut generator = PartyGenerator::new(Some(2), PlayerRanges::default()).unwrap();

        for _ in 0..200 {
            let party = generator.generate_party(None, 2).unwrap();
            assert!((1..=2).contains(&party.size()));
            assert!(party.max_size.party_slots() >= party.size());
        }
    }

    #[test]
    fn test_generate_party_with_fixed_count() {
        let mut generator = PartyGenerator::new(Some(3), PlayerRanges::default()).unwrap();

        let trio = generator.generate_party(Some(3), 3).unwrap();
        assert_eq!(trio.size(), 3);
        assert_eq!(trio.max_size, QueueCategory::Trio);

        assert!(generator.generate_party(Some(0), 3).is_err());
        assert!(generator.generate_party(None, 4).is_err());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut a = PartyGenerator::new(Some(42), PlayerRanges::default()).unwrap();
        let mut b = PartyGenerator::new(Some(42), PlayerRanges::default()).unwrap();

        assert_eq!(a.generate_parties(20).unwrap(), b.generate_parties(20).unwrap());
    }

    #[test]
    fn test_invalid_ranges_are_rejected() {
        let ranges = PlayerRanges {
            min_gear_score: 400,
            max_gear_score: 400,
            ..PlayerRanges::default()
        };
        assert!(PartyGenerator::new(None, ranges).is_err());
    }
}
