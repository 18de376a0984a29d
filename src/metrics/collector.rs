//! Metrics collection using Prometheus
//!
//! Each collector owns its own registry so simulations running side by side
//! (or in tests) never share counters.

use crate::lobby::CategoryTickReport;
use crate::types::QueueCategory;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the matchmaking engine
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Queue and lobby metrics
    queue_metrics: QueueMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Queue and lobby metrics, labelled by queue category
#[derive(Clone)]
pub struct QueueMetrics {
    /// Total parties offered to a queue
    pub parties_queued_total: IntCounterVec,

    /// Total lobbies started
    pub lobbies_started_total: IntCounterVec,

    /// Total parties evicted from started or canceled lobbies
    pub parties_dropped_total: IntCounterVec,

    /// Lobbies currently filling
    pub filling_lobbies: IntGaugeVec,

    /// Queue time of lobbies when they started
    pub lobby_queue_time_seconds: HistogramVec,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Wall-clock time spent processing one category tick
    pub tick_processing_duration: HistogramVec,

    /// Wall-clock time of a whole simulation run
    pub simulation_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let queue_metrics = QueueMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            queue_metrics,
            performance_metrics,
        })
    }

    /// Get queue metrics
    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    /// Record the outcome of one category tick
    pub fn record_tick(&self, report: &CategoryTickReport, duration: Duration) {
        let category = report.category.as_str();

        self.queue_metrics
            .parties_queued_total
            .with_label_values(&[category])
            .inc_by(report.parties_queued as u64);

        self.queue_metrics
            .lobbies_started_total
            .with_label_values(&[category])
            .inc_by(report.started.len() as u64);

        self.queue_metrics
            .parties_dropped_total
            .with_label_values(&[category])
            .inc_by(report.dropped_parties.len() as u64);

        self.queue_metrics
            .filling_lobbies
            .with_label_values(&[category])
            .set(report.filling_lobbies as i64);

        for lobby in &report.started {
            self.queue_metrics
                .lobby_queue_time_seconds
                .with_label_values(&[category])
                .observe(lobby.queue_time as f64);
        }

        self.performance_metrics
            .tick_processing_duration
            .with_label_values(&[category])
            .observe(duration.as_secs_f64());
    }

    /// Record a finished simulation run
    pub fn record_simulation(&self, duration: Duration) {
        self.performance_metrics
            .simulation_duration
            .observe(duration.as_secs_f64());
    }

    /// Total lobbies started for a category so far
    pub fn lobbies_started(&self, category: QueueCategory) -> u64 {
        self.queue_metrics
            .lobbies_started_total
            .with_label_values(&[category.as_str()])
            .get()
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Start a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time since timer creation
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return elapsed duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let parties_queued_total = IntCounterVec::new(
            Opts::new("crypt_queue_parties_queued_total", "Total parties queued"),
            &["category"],
        )?;
        registry.register(Box::new(parties_queued_total.clone()))?;

        let lobbies_started_total = IntCounterVec::new(
            Opts::new("crypt_queue_lobbies_started_total", "Total lobbies started"),
            &["category"],
        )?;
        registry.register(Box::new(lobbies_started_total.clone()))?;

        let parties_dropped_total = IntCounterVec::new(
            Opts::new(
                "crypt_queue_parties_dropped_total",
                "Total incomplete parties dropped from lobbies",
            ),
            &["category"],
        )?;
        registry.register(Box::new(parties_dropped_total.clone()))?;

        let filling_lobbies = IntGaugeVec::new(
            Opts::new("crypt_queue_filling_lobbies", "Number of filling lobbies"),
            &["category"],
        )?;
        registry.register(Box::new(filling_lobbies.clone()))?;

        let lobby_queue_time_seconds = HistogramVec::new(
            HistogramOpts::new(
                "crypt_queue_lobby_queue_time_seconds",
                "Lobby queue time at start in seconds",
            )
            .buckets(vec![5.0, 15.0, 30.0, 60.0, 90.0, 120.0, 180.0, 300.0]),
            &["category"],
        )?;
        registry.register(Box::new(lobby_queue_time_seconds.clone()))?;

        Ok(Self {
            parties_queued_total,
            lobbies_started_total,
            parties_dropped_total,
            filling_lobbies,
            lobby_queue_time_seconds,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let tick_processing_duration = HistogramVec::new(
            HistogramOpts::new(
                "crypt_queue_tick_processing_duration_seconds",
                "Time spent processing one category tick",
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.01, 0.1]),
            &["category"],
        )?;
        registry.register(Box::new(tick_processing_duration.clone()))?;

        let simulation_duration = Histogram::with_opts(HistogramOpts::new(
            "crypt_queue_simulation_duration_seconds",
            "Wall-clock duration of a simulation run",
        ))?;
        registry.register(Box::new(simulation_duration.clone()))?;

        Ok(Self {
            tick_processing_duration,
            simulation_duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::Lobby;
    use crate::types::{GameMap, Job, Party, Player};

    fn started_report() -> CategoryTickReport {
        let party = Party::new(
            vec![Player::new(Job::Bard, 1, 10).unwrap()],
            GameMap::IceCavern,
            1,
        )
        .unwrap();
        let mut lobby = Lobby::seeded(party);
        lobby.queue_time = 42;

        CategoryTickReport {
            category: QueueCategory::Solo,
            started: vec![lobby],
            dropped_parties: Vec::new(),
            filling_lobbies: 3,
            parties_queued: 2,
        }
    }

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let text = collector.render().unwrap();
        assert!(!text.contains("category=\"solo\""));
        assert_eq!(collector.lobbies_started(QueueCategory::Duo), 0);
    }

    #[test]
    fn test_tick_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_tick(&started_report(), Duration::from_micros(50));
        collector.record_tick(&started_report(), Duration::from_micros(50));

        assert_eq!(collector.lobbies_started(QueueCategory::Solo), 2);
        assert_eq!(collector.lobbies_started(QueueCategory::Trio), 0);
        assert_eq!(
            collector
                .queue()
                .filling_lobbies
                .with_label_values(&["solo"])
                .get(),
            3
        );
    }

    #[test]
    fn test_render_text_exposition() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        collector.record_tick(&started_report(), Duration::from_micros(50));
        collector.record_simulation(Duration::from_millis(5));

        let text = collector.render().unwrap();

        assert!(text.contains("crypt_queue_lobbies_started_total{category=\"solo\"} 1"));
        assert!(text.contains("crypt_queue_simulation_duration_seconds"));
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
    }
}
