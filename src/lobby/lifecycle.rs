//! Lobby start/cancel evaluation and status bookkeeping
//!
//! A filling lobby is resolved once its complete parties fill it or once it
//! has been queuing for the maximum queue time. Resolution always evicts the
//! incomplete parties; the lobby starts if any complete party remains and is
//! canceled otherwise.

use crate::lobby::instance::{Lobby, LobbyStatus};
use crate::types::Party;
use tracing::{debug, info};

/// Lobbies split by lifecycle status, each bucket in original order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LobbyPartition {
    pub filling: Vec<Lobby>,
    pub started: Vec<Lobby>,
    pub canceled: Vec<Lobby>,
}

/// Start or cancel a lobby that is full or has timed out.
///
/// Returns the parties evicted from the lobby. Lobbies that are neither full
/// nor timed out, and lobbies that already left the filling state, are left
/// untouched.
pub fn evaluate_start_or_cancel(lobby: &mut Lobby, max_queue_time: u64) -> Vec<Party> {
    if !lobby.is_filling() {
        return Vec::new();
    }

    let full_player_count = lobby.full_player_count();
    let is_full = full_player_count == lobby.max_players;
    let timed_out = lobby.is_timed_out(max_queue_time);

    if !is_full && !timed_out {
        return Vec::new();
    }

    let dropped_parties = lobby.drain_incomplete_parties();

    lobby.status = if full_player_count == 0 {
        LobbyStatus::Canceled
    } else {
        LobbyStatus::Started
    };

    info!(
        "Lobby {} {} - category: {}, map: {}, players: {}/{}, queue_time: {}s, full: {}, timed_out: {}, dropped_parties: {}",
        lobby.id,
        lobby.status,
        lobby.party_size,
        lobby.map,
        full_player_count,
        lobby.max_players,
        lobby.queue_time,
        is_full,
        timed_out,
        dropped_parties.len()
    );

    dropped_parties
}

/// Split lobbies into filling, started and canceled buckets
pub fn partition_by_status(lobbies: Vec<Lobby>) -> LobbyPartition {
    let mut partition = LobbyPartition::default();

    for lobby in lobbies {
        match lobby.status {
            LobbyStatus::Filling => partition.filling.push(lobby),
            LobbyStatus::Started => partition.started.push(lobby),
            LobbyStatus::Canceled => partition.canceled.push(lobby),
        }
    }

    partition
}

/// Advance the queue clock of every filling lobby
pub fn advance_queue_time(lobbies: &mut [Lobby], seconds: u64) {
    for lobby in lobbies.iter_mut().filter(|lobby| lobby.is_filling()) {
        lobby.queue_time = lobby.queue_time.saturating_add(seconds);
    }
    debug!("Advanced queue time by {}s for {} lobbies", seconds, lobbies.len());
}
