//! # Network
//!
//! The worker thread and the transport it drives, plus `Pipeline`, which
//! wires the channels, the response log and the worker together.

pub mod transport;
pub mod worker;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::core::channel::{CommandSender, WakeReceiver, command_channel, wake_channel};
use crate::core::error::AppError;
use crate::core::response_log::{LogReader, response_log};
use crate::core::shutdown::{self, ShutdownFlag, ShutdownReport};

pub use transport::{HttpTransport, TransferError, Transport};
pub use worker::{NetworkWorker, WorkerError, WorkerExit, WorkerHandle, WorkerStats};

/// The UI's view of a running worker.
pub struct Pipeline {
    pub commands: CommandSender,
    pub log: LogReader,
    pub wake: WakeReceiver,
    shutdown: Arc<ShutdownFlag>,
    worker: WorkerHandle,
}

impl Pipeline {
    /// Create the channels and the log, then spawn the worker thread.
    pub fn start(
        transport: Arc<dyn Transport>,
        log_capacity: usize,
        poll_timeout: Duration,
    ) -> io::Result<Self> {
        let (commands, command_rx) = command_channel();
        let (wake_tx, wake) = wake_channel();
        let (log_writer, log) = response_log(log_capacity);
        let shutdown = ShutdownFlag::new();

        let worker = NetworkWorker::new(
            transport,
            command_rx,
            log_writer,
            wake_tx,
            shutdown.clone(),
            poll_timeout,
        )
        .spawn()?;

        Ok(Self {
            commands,
            log,
            wake,
            shutdown,
            worker,
        })
    }

    /// True once the worker thread has returned (normally only after a fatal error).
    pub fn worker_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Stop the worker and release everything. Consumes the pipeline.
    pub fn shutdown(self) -> Result<ShutdownReport, AppError> {
        let Pipeline {
            commands,
            log,
            wake,
            shutdown: flag,
            worker,
        } = self;
        let report = shutdown::coordinate(&flag, worker, commands, log);
        drop(wake);
        report
    }
}
