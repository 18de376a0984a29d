//! Tick-by-tick simulation of the three matchmaking queues
//!
//! Every tick a batch of random parties is generated, each party is routed to
//! the worker for its declared queue size and the three workers process their
//! share of the batch concurrently. The run ends after
//! `duration_seconds / tick_seconds` ticks, at which point the workers hand
//! back whatever is still filling.

use crate::config::AppConfig;
use crate::error::Result;
use crate::lobby::{CategoryQueue, MatchmakingRules};
use crate::metrics::MetricsCollector;
use crate::service::{spawn_worker, WorkerHandle, DEFAULT_CHANNEL_SIZE};
use crate::simulation::generator::PartyGenerator;
use crate::simulation::report::MatchmakingReport;
use crate::types::{Party, QueueCategory};
use std::sync::Arc;
use tracing::{debug, info};

/// Parties of one tick, split by declared queue size
#[derive(Debug, Default)]
struct RoutedArrivals {
    solo: Vec<Party>,
    duo: Vec<Party>,
    trio: Vec<Party>,
}

impl RoutedArrivals {
    fn route(parties: Vec<Party>) -> Self {
        let mut routed = Self::default();
        for party in parties {
            match party.max_size {
                QueueCategory::Solo => routed.solo.push(party),
                QueueCategory::Duo => routed.duo.push(party),
                QueueCategory::Trio => routed.trio.push(party),
            }
        }
        routed
    }
}

/// The three category workers of a running simulation
struct CategoryWorkers {
    solo: WorkerHandle,
    duo: WorkerHandle,
    trio: WorkerHandle,
}

impl CategoryWorkers {
    fn spawn(rules: MatchmakingRules, metrics: &Arc<MetricsCollector>) -> Self {
        let spawn = |category| {
            spawn_worker(
                CategoryQueue::new(category, rules),
                Some(metrics.clone()),
                DEFAULT_CHANNEL_SIZE,
            )
        };

        Self {
            solo: spawn(QueueCategory::Solo),
            duo: spawn(QueueCategory::Duo),
            trio: spawn(QueueCategory::Trio),
        }
    }

    async fn shutdown(self) -> Result<Vec<CategoryQueue>> {
        let (solo, duo, trio) =
            tokio::try_join!(self.solo.shutdown(), self.duo.shutdown(), self.trio.shutdown())?;
        Ok(vec![solo, duo, trio])
    }
}

/// A configured simulation run
pub struct Simulation {
    config: AppConfig,
    rules: MatchmakingRules,
    metrics: Arc<MetricsCollector>,
}

impl Simulation {
    pub fn new(config: AppConfig, metrics: Arc<MetricsCollector>) -> Result<Self> {
        let rules = MatchmakingRules::from_settings(&config.matchmaking)?;
        Ok(Self {
            config,
            rules,
            metrics,
        })
    }

    /// Run every tick and collect the final report
    pub async fn run(&self) -> Result<MatchmakingReport> {
        let timer = self.metrics.start_timer();
        let settings = &self.config.simulation;
        let tick_seconds = settings.tick_seconds;
        let ticks = self.config.tick_count();

        info!(
            "Simulating {} ticks of {}s with {} arrivals per tick",
            ticks, tick_seconds, settings.arrivals_per_tick
        );

        let mut generator = PartyGenerator::from_settings(settings)?;
        let workers = CategoryWorkers::spawn(self.rules, &self.metrics);
        let mut report = MatchmakingReport::new(self.rules);

        for tick in 0..ticks {
            let arrivals = generator.generate_parties(settings.arrivals_per_tick)?;
            report.summary.parties_generated += arrivals.len() as u64;

            let routed = RoutedArrivals::route(arrivals);
            let (solo, duo, trio) = tokio::try_join!(
                workers.solo.tick(routed.solo, tick_seconds),
                workers.duo.tick(routed.duo, tick_seconds),
                workers.trio.tick(routed.trio, tick_seconds),
            )?;

            let started = solo.started.len() + duo.started.len() + trio.started.len();
            if started > 0 {
                debug!("Tick {}: {} lobbies started", tick, started);
            }

            report.record_tick(solo);
            report.record_tick(duo);
            report.record_tick(trio);
            report.summary.ticks += 1;
            report.summary.simulated_seconds += tick_seconds;
        }

        for queue in workers.shutdown().await? {
            let category = queue.category();
            report.set_filling(category, queue.into_forming());
        }

        let elapsed = timer.stop();
        self.metrics.record_simulation(elapsed);

        info!(
            "Simulation finished in {:?}: {} lobbies started, {} parties dropped, {} lobbies still filling",
            elapsed,
            report.summary.lobbies_started,
            report.summary.parties_dropped,
            report.summary.lobbies_filling
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::LobbyStatus;

    fn test_config(duration_seconds: u64, seed: u64) -> AppConfig {
        let mut config = AppConfig::default();
        config.simulation.duration_seconds = duration_seconds;
        config.simulation.arrivals_per_tick = 10;
        config.simulation.seed = Some(seed);
        config
    }

    #[test]
    fn test_route_by_declared_size() {
        let mut generator = PartyGenerator::from_settings(&test_config(1, 9).simulation).unwrap();
        let parties = generator.generate_parties(50).unwrap();

        let routed = RoutedArrivals::route(parties);

        assert_eq!(routed.solo.len() + routed.duo.len() + routed.trio.len(), 50);
        assert!(routed.solo.iter().all(|p| p.max_size == QueueCategory::Solo));
        assert!(routed.duo.iter().all(|p| p.max_size == QueueCategory::Duo));
        assert!(routed.trio.iter().all(|p| p.max_size == QueueCategory::Trio));
    }

    #[tokio::test]
    async fn test_simulation_run() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let simulation = Simulation::new(test_config(300, 7), metrics.clone()).unwrap();

        let report = simulation.run().await.unwrap();

        assert_eq!(report.summary.ticks, 300);
        assert_eq!(report.summary.parties_generated, 3000);
        assert!(report.summary.lobbies_started > 0);

        for (category, lobbies) in &report.started {
            for lobby in lobbies {
                assert_eq!(lobby.status, LobbyStatus::Started);
                assert_eq!(lobby.party_size, *category);
                assert!(lobby.current_player_count() <= lobby.max_players);
                assert!(lobby
                    .parties()
                    .iter()
                    .all(|p| p.is_complete(category.party_slots())));
            }
        }
        for lobbies in report.filling.values() {
            assert!(lobbies.iter().all(|l| l.status == LobbyStatus::Filling));
            assert!(lobbies.iter().all(|l| l.queue_time <= 120));
        }

        let recorded: u64 = QueueCategory::ALL
            .iter()
            .map(|c| metrics.lobbies_started(*c))
            .sum();
        assert_eq!(recorded, report.summary.lobbies_started);
    }

    #[tokio::test]
    async fn test_seeded_runs_match() {
        let first = Simulation::new(test_config(60, 11), Arc::new(MetricsCollector::new().unwrap()))
            .unwrap()
            .run()
            .await
            .unwrap();
        let second = Simulation::new(test_config(60, 11), Arc::new(MetricsCollector::new().unwrap()))
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(first.summary, second.summary);
        assert_eq!(first.canceled_parties, second.canceled_parties);
    }
}
