//! One matchmaking worker per queue category
//!
//! Each worker is a tokio task that owns a [`CategoryQueue`] and processes
//! commands from a bounded channel in arrival order. Only the worker touches
//! its pool, so ticks for one category never interleave and no lock is
//! needed. Workers for different categories share nothing and run in
//! parallel.

use crate::error::{MatchmakingError, Result};
use crate::lobby::{CategoryQueue, CategoryTickReport, Lobby};
use crate::metrics::MetricsCollector;
use crate::types::{Party, QueueCategory};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default command channel size for category workers
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Commands accepted by a category worker
pub enum WorkerCommand {
    /// Matchmake the arrivals of one tick and advance the queue clock
    Tick {
        parties: Vec<Party>,
        tick_seconds: u64,
        reply: oneshot::Sender<Result<CategoryTickReport>>,
    },
    /// Copy of the lobbies currently filling
    Snapshot { reply: oneshot::Sender<Vec<Lobby>> },
}

/// Handle to a running category worker
pub struct WorkerHandle {
    category: QueueCategory,
    sender: mpsc::Sender<WorkerCommand>,
    task: JoinHandle<CategoryQueue>,
}

impl WorkerHandle {
    pub fn category(&self) -> QueueCategory {
        self.category
    }

    fn unavailable(&self) -> anyhow::Error {
        MatchmakingError::InternalError {
            message: format!("{} worker is no longer running", self.category),
        }
        .into()
    }

    /// Send one tick's arrivals and wait for the outcome
    pub async fn tick(&self, parties: Vec<Party>, tick_seconds: u64) -> Result<CategoryTickReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(WorkerCommand::Tick {
                parties,
                tick_seconds,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Request the lobbies currently filling
    pub async fn snapshot(&self) -> Result<Vec<Lobby>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(WorkerCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Close the channel and wait for the worker to hand back its queue
    pub async fn shutdown(self) -> Result<CategoryQueue> {
        let WorkerHandle {
            category,
            sender,
            task,
        } = self;
        drop(sender);

        task.await.map_err(|e| {
            anyhow::Error::from(MatchmakingError::InternalError {
                message: format!("{} worker failed: {}", category, e),
            })
        })
    }
}

/// Spawn a worker that owns `queue`
pub fn spawn_worker(
    queue: CategoryQueue,
    metrics: Option<Arc<MetricsCollector>>,
    channel_size: usize,
) -> WorkerHandle {
    let category = queue.category();
    let (tx, rx) = mpsc::channel(channel_size);
    let task = tokio::spawn(run_worker(queue, rx, metrics));

    WorkerHandle {
        category,
        sender: tx,
        task,
    }
}

async fn run_worker(
    mut queue: CategoryQueue,
    mut receiver: mpsc::Receiver<WorkerCommand>,
    metrics: Option<Arc<MetricsCollector>>,
) -> CategoryQueue {
    info!("{} worker started", queue.category());

    while let Some(command) = receiver.recv().await {
        match command {
            WorkerCommand::Tick {
                parties,
                tick_seconds,
                reply,
            } => {
                let start_time = std::time::Instant::now();
                let result = queue.process_tick(parties, tick_seconds);

                match (&result, &metrics) {
                    (Ok(report), Some(metrics)) => metrics.record_tick(report, start_time.elapsed()),
                    (Err(e), _) => error!("{} tick failed: {}", queue.category(), e),
                    _ => {}
                }

                if reply.send(result).is_err() {
                    warn!("{} tick result dropped, caller went away", queue.category());
                }
            }
            WorkerCommand::Snapshot { reply } => {
                if reply.send(queue.forming().to_vec()).is_err() {
                    warn!("{} snapshot dropped, caller went away", queue.category());
                }
            }
        }
    }

    debug!(
        "{} worker stopped - {} lobbies still filling",
        queue.category(),
        queue.forming().len()
    );
    queue
}
