//! Test fixtures for building players, parties and lobbies

#![allow(dead_code)]

use crypt_queue::config::AppConfig;
use crypt_queue::lobby::Lobby;
use crypt_queue::types::{GameMap, Job, Party, Player};

/// Player with the given gear score
pub fn player(gear_score: u32) -> Player {
    Player::new(Job::Fighter, 50, gear_score).expect("valid player")
}

/// Party with one player per gear score
pub fn party(gear_scores: &[u32], map: GameMap, max_size: usize) -> Party {
    let players = gear_scores.iter().map(|gs| player(*gs)).collect();
    Party::new(players, map, max_size).expect("valid party")
}

/// Single player queuing for solos on goblin caves
pub fn solo(gear_score: u32) -> Party {
    party(&[gear_score], GameMap::GoblinCaves, 1)
}

/// Lobby built from existing parties
pub fn lobby_with(party_size: usize, map: GameMap, parties: Vec<Party>) -> Lobby {
    Lobby::with_parties(party_size, map, parties).expect("valid lobby")
}

/// Small seeded configuration for end-to-end runs
pub fn seeded_config(duration_seconds: u64, arrivals_per_tick: usize, seed: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.simulation.duration_seconds = duration_seconds;
    config.simulation.arrivals_per_tick = arrivals_per_tick;
    config.simulation.seed = Some(seed);
    config
}
