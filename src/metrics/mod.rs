//! Metrics for the matchmaking engine
//!
//! Prometheus counters and histograms describing queue throughput and tick
//! processing cost.

pub mod collector;

pub use collector::{MetricsCollector, MetricsTimer, PerformanceMetrics, QueueMetrics};
