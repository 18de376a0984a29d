//! Simulation results and their JSON rendering

use crate::error::Result;
use crate::lobby::{CategoryTickReport, Lobby, MatchmakingRules};
use crate::types::{Party, QueueCategory};
use crate::utils::current_timestamp;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Totals over a whole simulation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub ticks: u64,
    pub simulated_seconds: u64,
    pub parties_generated: u64,
    pub lobbies_started: u64,
    pub players_started: u64,
    pub parties_dropped: u64,
    pub lobbies_filling: u64,
}

/// Final state of a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchmakingReport {
    /// Started lobbies by queue category
    pub started: BTreeMap<QueueCategory, Vec<Lobby>>,
    /// Lobbies still filling when the run ended
    pub filling: BTreeMap<QueueCategory, Vec<Lobby>>,
    /// Parties evicted from started or canceled lobbies
    pub canceled_parties: Vec<Party>,
    pub summary: SimulationSummary,
    pub rules: MatchmakingRules,
    pub generated_at: DateTime<Utc>,
}

impl MatchmakingReport {
    pub fn new(rules: MatchmakingRules) -> Self {
        let empty = || -> BTreeMap<QueueCategory, Vec<Lobby>> {
            QueueCategory::ALL
                .iter()
                .map(|category| (*category, Vec::new()))
                .collect()
        };

        Self {
            started: empty(),
            filling: empty(),
            canceled_parties: Vec::new(),
            summary: SimulationSummary::default(),
            rules,
            generated_at: current_timestamp(),
        }
    }

    /// Accumulate one category's tick outcome
    pub fn record_tick(&mut self, report: CategoryTickReport) {
        self.summary.lobbies_started += report.started.len() as u64;
        self.summary.players_started += report
            .started
            .iter()
            .map(|lobby| lobby.current_player_count() as u64)
            .sum::<u64>();
        self.summary.parties_dropped += report.dropped_parties.len() as u64;

        self.started
            .entry(report.category)
            .or_default()
            .extend(report.started);
        self.canceled_parties.extend(report.dropped_parties);
    }

    /// Store the lobbies a category still had filling at the end
    pub fn set_filling(&mut self, category: QueueCategory, lobbies: Vec<Lobby>) {
        self.filling.insert(category, lobbies);
        self.summary.lobbies_filling = self.filling.values().map(|l| l.len() as u64).sum();
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }
}
