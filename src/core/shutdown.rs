//! # Shutdown
//!
//! Cooperative termination between the UI thread and the network worker.
//!
//! ```text
//! UI: request() ──► flag = true, notify worker
//!     join worker ◄── worker observes flag at loop top, drops transfer, exits
//!     reclaim queued FetchRequests (the worker returns the receiver)
//!     drop log + channels
//! ```
//!
//! `coordinate` consumes the `WorkerHandle`, so it can only run once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info};
use tokio::sync::Notify;

use crate::core::channel::CommandSender;
use crate::core::error::AppError;
use crate::core::response_log::LogReader;
use crate::network::worker::WorkerHandle;

/// Shared "please stop" flag plus a way to interrupt the worker's wait.
#[derive(Debug, Default)]
pub struct ShutdownFlag {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownFlag {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Set the flag and wake the worker if it is waiting.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        // notify_one keeps a permit if nobody is waiting yet
        self.notify.notify_one();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Resolves after `request()` has been called.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// What the shutdown found and released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Requests that were still queued and never reached the worker.
    pub reclaimed: usize,
    pub started: usize,
    pub completed: usize,
    pub failed: usize,
    /// Responses held by the log when it was released.
    pub published: usize,
}

/// Stop the worker and release everything the two threads shared.
///
/// Undelivered requests are reclaimed even when the worker stopped because of
/// a fatal error; that error is returned after cleanup.
pub fn coordinate(
    flag: &ShutdownFlag,
    worker: WorkerHandle,
    commands: CommandSender,
    log: LogReader,
) -> Result<ShutdownReport, AppError> {
    info!("Shutdown requested");
    flag.request();

    let mut exit = worker.join()?;
    let reclaimed = exit.commands.reclaim();
    drop(commands);

    let report = ShutdownReport {
        reclaimed,
        started: exit.stats.started,
        completed: exit.stats.completed,
        failed: exit.stats.failed,
        published: log.published(),
    };
    drop(log);

    info!(
        "Shutdown complete: {} started, {} completed ({} failed), {} reclaimed, {} responses released",
        report.started, report.completed, report.failed, report.reclaimed, report.published
    );

    if let Err(e) = exit.result {
        error!("Network worker stopped with a fatal error: {}", e);
        return Err(AppError::Worker(e));
    }
    Ok(report)
}
