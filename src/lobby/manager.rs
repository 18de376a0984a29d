//! Per-tick matchmaking orchestration
//!
//! [`matchmake_party`] is the stateless entry point: it places one party into
//! a pool of same-category lobbies and resolves every lobby that became full
//! or timed out. [`CategoryQueue`] owns one category's forming pool across
//! ticks for callers that want the bookkeeping done for them.

use crate::config::MatchmakingSettings;
use crate::error::{MatchmakingError, Result};
use crate::lobby::instance::Lobby;
use crate::lobby::lifecycle::{advance_queue_time, evaluate_start_or_cancel, partition_by_status};
use crate::lobby::matching::DEFAULT_RATING_THRESHOLD;
use crate::lobby::placement::place_party;
use crate::rating::{RatingFn, RatingMethod};
use crate::types::{Party, QueueCategory};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Lobbies and parties produced by one matchmaking step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// Lobbies still accepting parties, in pool order
    pub filling: Vec<Lobby>,
    /// Lobbies that started during this step
    pub started: Vec<Lobby>,
    /// Incomplete parties evicted from started or canceled lobbies
    pub dropped_parties: Vec<Party>,
}

impl TickOutcome {
    /// Fold a later outcome into this one; its filling pool replaces ours
    pub fn absorb(&mut self, later: TickOutcome) {
        self.filling = later.filling;
        self.started.extend(later.started);
        self.dropped_parties.extend(later.dropped_parties);
    }
}

/// Resolve every lobby in a pool and split off the ones that left `filling`.
///
/// Canceled lobbies are discarded: all their parties were incomplete and
/// are returned in `dropped_parties`.
pub fn evaluate_pool(mut lobbies: Vec<Lobby>, max_queue_time: u64) -> TickOutcome {
    let mut dropped_parties = Vec::new();
    for lobby in lobbies.iter_mut() {
        dropped_parties.extend(evaluate_start_or_cancel(lobby, max_queue_time));
    }

    let partition = partition_by_status(lobbies);
    debug_assert!(partition.canceled.iter().all(Lobby::is_empty));
    if !partition.canceled.is_empty() {
        debug!("Discarding {} canceled lobbies", partition.canceled.len());
    }

    TickOutcome {
        filling: partition.filling,
        started: partition.started,
        dropped_parties,
    }
}

/// Place one party and resolve the resulting pool
pub fn matchmake_party(
    lobbies: Vec<Lobby>,
    party: Party,
    max_queue_time: u64,
    rating_fn: RatingFn,
    threshold: f64,
) -> Result<TickOutcome> {
    let lobbies = place_party(lobbies, party, rating_fn, threshold)?;
    Ok(evaluate_pool(lobbies, max_queue_time))
}

/// Matchmaking knobs shared by every queue category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchmakingRules {
    /// Seconds a lobby may stay filling before it is resolved
    pub max_queue_time: u64,
    pub rating_method: RatingMethod,
    /// Maximum rating gap between any two parties of a lobby
    pub threshold: f64,
}

impl Default for MatchmakingRules {
    fn default() -> Self {
        Self {
            max_queue_time: 120,
            rating_method: RatingMethod::default(),
            threshold: DEFAULT_RATING_THRESHOLD,
        }
    }
}

impl MatchmakingRules {
    /// Build rules from configuration, resolving the rating method identifier
    pub fn from_settings(settings: &MatchmakingSettings) -> Result<Self> {
        if settings.rating_threshold < 0.0 {
            return Err(MatchmakingError::ConfigurationError {
                message: format!(
                    "Rating threshold must not be negative: {}",
                    settings.rating_threshold
                ),
            }
            .into());
        }

        Ok(Self {
            max_queue_time: settings.max_queue_time_seconds,
            rating_method: settings.rating_method.parse()?,
            threshold: settings.rating_threshold,
        })
    }

    pub fn rating_fn(&self) -> RatingFn {
        self.rating_method.rating_fn()
    }
}

/// Counters kept by a category queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryQueueStats {
    /// Total parties offered to this queue
    pub parties_queued: u64,
    /// Total lobbies started
    pub lobbies_started: u64,
    /// Total parties evicted at start or cancel time
    pub parties_dropped: u64,
    /// Ticks processed
    pub ticks: u64,
}

/// Result of processing one tick for a category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTickReport {
    pub category: QueueCategory,
    pub started: Vec<Lobby>,
    pub dropped_parties: Vec<Party>,
    /// Filling lobbies left after the tick
    pub filling_lobbies: usize,
    /// Parties received during the tick
    pub parties_queued: usize,
}

/// Forming-lobby pool for a single queue category
#[derive(Debug, Clone)]
pub struct CategoryQueue {
    category: QueueCategory,
    rules: MatchmakingRules,
    forming: Vec<Lobby>,
    stats: CategoryQueueStats,
}

impl CategoryQueue {
    pub fn new(category: QueueCategory, rules: MatchmakingRules) -> Self {
        Self {
            category,
            rules,
            forming: Vec::new(),
            stats: CategoryQueueStats::default(),
        }
    }

    pub fn category(&self) -> QueueCategory {
        self.category
    }

    pub fn rules(&self) -> &MatchmakingRules {
        &self.rules
    }

    pub fn stats(&self) -> &CategoryQueueStats {
        &self.stats
    }

    /// Lobbies currently filling, oldest first
    pub fn forming(&self) -> &[Lobby] {
        &self.forming
    }

    pub fn into_forming(self) -> Vec<Lobby> {
        self.forming
    }

    /// Process one tick: matchmake each arrival in order, resolve timeouts,
    /// then advance the queue clock of the remaining lobbies.
    pub fn process_tick(&mut self, parties: Vec<Party>, tick_seconds: u64) -> Result<CategoryTickReport> {
        // Reject the whole tick before the pool is touched
        let slots = self.category.party_slots();
        for party in &parties {
            if party.max_size != self.category {
                return Err(MatchmakingError::CategoryMismatch {
                    expected: self.category,
                    actual: party.max_size,
                }
                .into());
            }
            if party.size() > slots {
                return Err(MatchmakingError::PartyTooLarge {
                    size: party.size(),
                    max_size: slots,
                }
                .into());
            }
        }

        let parties_queued = parties.len();
        let rating_fn = self.rules.rating_fn();
        let mut outcome = TickOutcome::default();

        for party in parties {
            let pool = std::mem::take(&mut self.forming);
            let step = matchmake_party(
                pool,
                party,
                self.rules.max_queue_time,
                rating_fn,
                self.rules.threshold,
            )?;
            outcome.absorb(step);
            self.forming = std::mem::take(&mut outcome.filling);
        }

        outcome.absorb(evaluate_pool(
            std::mem::take(&mut self.forming),
            self.rules.max_queue_time,
        ));
        self.forming = std::mem::take(&mut outcome.filling);
        advance_queue_time(&mut self.forming, tick_seconds);

        self.stats.ticks += 1;
        self.stats.parties_queued += parties_queued as u64;
        self.stats.lobbies_started += outcome.started.len() as u64;
        self.stats.parties_dropped += outcome.dropped_parties.len() as u64;

        if !outcome.started.is_empty() || !outcome.dropped_parties.is_empty() {
            info!(
                "{} queue tick {} - queued: {}, started: {}, dropped: {}, filling: {}",
                self.category,
                self.stats.ticks,
                parties_queued,
                outcome.started.len(),
                outcome.dropped_parties.len(),
                self.forming.len()
            );
        }

        Ok(CategoryTickReport {
            category: self.category,
            started: outcome.started,
            dropped_parties: outcome.dropped_parties,
            filling_lobbies: self.forming.len(),
            parties_queued,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::instance::LobbyStatus;
    use crate::rating::max_gear_score_rating;
    use crate::types::{GameMap, Job, Player};

    fn party(gear_scores: &[u32], max_size: usize) -> Party {
        let players = gear_scores
            .iter()
            .map(|gs| Player::new(Job::Warlock, 50, *gs).unwrap())
            .collect();
        Party::new(players, GameMap::HowlingCrypts, max_size).unwrap()
    }

    #[test]
    fn test_matchmake_first_party_opens_lobby() {
        let outcome = matchmake_party(Vec::new(), party(&[100], 1), 120, max_gear_score_rating, 50.0)
            .unwrap();

        assert_eq!(outcome.filling.len(), 1);
        assert!(outcome.started.is_empty());
        assert!(outcome.dropped_parties.is_empty());
    }

    #[test]
    fn test_matchmake_tenth_solo_starts_lobby() {
        let mut pool = Vec::new();
        for _ in 0..9 {
            let outcome =
                matchmake_party(pool, party(&[100], 1), 120, max_gear_score_rating, 50.0).unwrap();
            assert!(outcome.started.is_empty());
            pool = outcome.filling;
        }

        let outcome =
            matchmake_party(pool, party(&[100], 1), 120, max_gear_score_rating, 50.0).unwrap();

        assert!(outcome.filling.is_empty());
        assert_eq!(outcome.started.len(), 1);
        assert_eq!(outcome.started[0].status, LobbyStatus::Started);
        assert_eq!(outcome.started[0].current_player_count(), 10);
    }

    #[test]
    fn test_matchmake_drops_parties_of_timed_out_lobbies() {
        let mut stale = Lobby::seeded(party(&[100], 3));
        stale.queue_time = 200;

        let outcome =
            matchmake_party(vec![stale], party(&[390], 3), 120, max_gear_score_rating, 50.0)
                .unwrap();

        assert_eq!(outcome.dropped_parties.len(), 1);
        assert_eq!(outcome.dropped_parties[0].players()[0].gear_score, 100);
        assert_eq!(outcome.filling.len(), 1);
        assert!(outcome.started.is_empty());
    }

    #[test]
    fn test_rules_from_settings() {
        let settings = MatchmakingSettings {
            max_queue_time_seconds: 60,
            rating_method: "avg_gs".to_string(),
            rating_threshold: 25.0,
        };
        let rules = MatchmakingRules::from_settings(&settings).unwrap();
        assert_eq!(rules.rating_method, RatingMethod::AverageGearScore);
        assert_eq!(rules.max_queue_time, 60);

        let bad = MatchmakingSettings {
            rating_method: "elo".to_string(),
            ..settings
        };
        let err = MatchmakingRules::from_settings(&bad).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MatchmakingError>(),
            Some(MatchmakingError::UnsupportedRatingMethod { .. })
        ));
    }

    #[test]
    fn test_category_queue_rejects_wrong_category() {
        let mut queue = CategoryQueue::new(QueueCategory::Duo, MatchmakingRules::default());

        let err = queue.process_tick(vec![party(&[100], 3)], 1).unwrap_err();

        assert_eq!(
            err.downcast_ref::<MatchmakingError>(),
            Some(&MatchmakingError::CategoryMismatch {
                expected: QueueCategory::Duo,
                actual: QueueCategory::Trio,
            })
        );
        assert!(queue.forming().is_empty());
    }

    #[test]
    fn test_failed_tick_keeps_forming_pool() {
        let mut queue = CategoryQueue::new(QueueCategory::Solo, MatchmakingRules::default());
        queue.process_tick(vec![party(&[100], 1)], 1).unwrap();
        assert_eq!(queue.forming().len(), 1);

        // Two players declared for solos can only come from a bad merge
        let mut oversized = party(&[100], 1);
        oversized.absorb(party(&[105], 1), QueueCategory::Solo);

        let err = queue
            .process_tick(vec![party(&[102], 1), oversized], 1)
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<MatchmakingError>(),
            Some(&MatchmakingError::PartyTooLarge { size: 2, max_size: 1 })
        );
        assert_eq!(queue.forming().len(), 1);
        assert_eq!(queue.forming()[0].current_player_count(), 1);
        assert_eq!(queue.forming()[0].queue_time, 1);
        assert_eq!(queue.stats().ticks, 1);
        assert_eq!(queue.stats().parties_queued, 1);
    }

    #[test]
    fn test_category_queue_times_out_without_arrivals() {
        let rules = MatchmakingRules {
            max_queue_time: 3,
            ..MatchmakingRules::default()
        };
        let mut queue = CategoryQueue::new(QueueCategory::Trio, rules);

        let first = queue.process_tick(vec![party(&[100], 3)], 1).unwrap();
        assert_eq!(first.filling_lobbies, 1);
        assert_eq!(queue.forming()[0].queue_time, 1);

        queue.process_tick(Vec::new(), 1).unwrap();
        queue.process_tick(Vec::new(), 1).unwrap();
        let last = queue.process_tick(Vec::new(), 1).unwrap();

        assert_eq!(last.dropped_parties.len(), 1);
        assert_eq!(last.filling_lobbies, 0);
        assert_eq!(queue.stats().parties_dropped, 1);
        assert_eq!(queue.stats().ticks, 4);
    }

    #[test]
    fn test_category_queue_starts_full_lobby() {
        let mut queue = CategoryQueue::new(QueueCategory::Trio, MatchmakingRules::default());
        let trios = (0..5).map(|_| party(&[200, 210, 220], 3)).collect();

        let report = queue.process_tick(trios, 1).unwrap();

        assert_eq!(report.started.len(), 1);
        assert_eq!(report.started[0].current_player_count(), 15);
        assert_eq!(report.filling_lobbies, 0);
        assert_eq!(queue.stats().lobbies_started, 1);
        assert_eq!(queue.stats().parties_queued, 5);
    }
}
