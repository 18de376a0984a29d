//! Main application configuration
//!
//! This module defines the configuration structures for the crypt-queue
//! simulator, including TOML and environment variable loading and validation.

use crate::rating::RatingMethod;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub simulation: SimulationSettings,
    pub matchmaking: MatchmakingSettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Simulated time loop and party generator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Total simulated time in seconds
    pub duration_seconds: u64,
    /// Simulated seconds per tick
    pub tick_seconds: u64,
    /// Parties generated every tick
    pub arrivals_per_tick: usize,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
    /// Where the JSON report is written
    pub output_path: PathBuf,
    pub min_level: u32,
    pub max_level: u32,
    pub min_gear_score: u32,
    pub max_gear_score: u32,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Maximum time a lobby stays filling, in seconds
    pub max_queue_time_seconds: u64,
    /// Rating method identifier (max_gs, avg_gs)
    pub rating_method: String,
    /// Maximum rating difference between parties of a lobby
    pub rating_threshold: f64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "crypt-queue".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            duration_seconds: 600, // 10 minutes
            tick_seconds: 1,
            arrivals_per_tick: 5,
            seed: None,
            output_path: PathBuf::from("matchmaking_results.json"),
            min_level: 1,
            max_level: 300,
            min_gear_score: 1,
            max_gear_score: 400,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            max_queue_time_seconds: 120, // 2 minutes
            rating_method: RatingMethod::default().id().to_string(),
            rating_threshold: 50.0,
        }
    }
}

/// Parse an environment variable into `target` if it is set
fn override_from_env<T: std::str::FromStr>(key: &str, target: &mut T) -> Result<()> {
    if let Ok(value) = env::var(key) {
        *target = value
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", key, value))?;
    }
    Ok(())
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Simulation settings
        override_from_env("SIMULATION_DURATION_SECONDS", &mut self.simulation.duration_seconds)?;
        override_from_env("SIMULATION_TICK_SECONDS", &mut self.simulation.tick_seconds)?;
        override_from_env("ARRIVALS_PER_TICK", &mut self.simulation.arrivals_per_tick)?;
        if let Ok(seed) = env::var("SIMULATION_SEED") {
            self.simulation.seed = Some(
                seed.parse()
                    .map_err(|_| anyhow!("Invalid SIMULATION_SEED value: {}", seed))?,
            );
        }
        if let Ok(path) = env::var("OUTPUT_PATH") {
            self.simulation.output_path = PathBuf::from(path);
        }

        // Matchmaking settings
        override_from_env(
            "MAX_QUEUE_TIME_SECONDS",
            &mut self.matchmaking.max_queue_time_seconds,
        )?;
        if let Ok(method) = env::var("RATING_METHOD") {
            self.matchmaking.rating_method = method;
        }
        override_from_env("RATING_THRESHOLD", &mut self.matchmaking.rating_threshold)?;

        Ok(())
    }

    /// Number of ticks needed to cover the simulated duration
    pub fn tick_count(&self) -> u64 {
        if self.simulation.tick_seconds == 0 {
            return 0;
        }
        self.simulation.duration_seconds.div_ceil(self.simulation.tick_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate simulation settings
    let simulation = &config.simulation;
    if simulation.duration_seconds == 0 {
        return Err(anyhow!("Simulation duration must be greater than 0"));
    }
    if simulation.tick_seconds == 0 {
        return Err(anyhow!("Tick length must be greater than 0"));
    }
    if simulation.min_level == 0 || simulation.min_level >= simulation.max_level {
        return Err(anyhow!(
            "Invalid level range: {}..{}",
            simulation.min_level,
            simulation.max_level
        ));
    }
    if simulation.min_gear_score == 0 || simulation.min_gear_score >= simulation.max_gear_score {
        return Err(anyhow!(
            "Invalid gear score range: {}..{}",
            simulation.min_gear_score,
            simulation.max_gear_score
        ));
    }

    // Validate matchmaking settings
    if config.matchmaking.max_queue_time_seconds == 0 {
        return Err(anyhow!("Max queue time must be greater than 0"));
    }
    if !config.matchmaking.rating_threshold.is_finite() || config.matchmaking.rating_threshold < 0.0
    {
        return Err(anyhow!(
            "Rating threshold must be a non-negative number: {}",
            config.matchmaking.rating_threshold
        ));
    }
    config
        .matchmaking
        .rating_method
        .parse::<RatingMethod>()?;

    Ok(())
}
