//! Service layer for running matchmaking concurrently
//!
//! This module hosts the per-category workers that drive the matchmaking
//! engine from async code.

pub mod worker;

pub use worker::{spawn_worker, WorkerCommand, WorkerHandle, DEFAULT_CHANNEL_SIZE};
