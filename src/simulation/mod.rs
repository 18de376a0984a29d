//! Queue simulation
//!
//! Generates random parties, feeds them through the category workers tick by
//! tick and collects the resulting lobbies into a report.

pub mod driver;
pub mod generator;
pub mod report;

pub use driver::Simulation;
pub use generator::{PartyGenerator, PlayerRanges};
pub use report::{MatchmakingReport, SimulationSummary};
