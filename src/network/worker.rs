//! # Network Worker
//!
//! Runs on its own OS thread with a current-thread tokio runtime and drives
//! at most one transfer at a time.
//!
//! ```text
//!            command received
//!   ┌──────┐ ───────────────► ┌──────────────┐
//!   │ Idle │                  │ Transferring │
//!   └──────┘ ◄─────────────── └──────────────┘
//!        ▲    transfer done:        │
//!        │    publish slot, wake UI │
//!        └──── shutdown flag at loop top ──► Stopped
//! ```
//!
//! Each iteration waits on whichever comes first: a shutdown request, the
//! in-flight transfer finishing, a queued command (only while idle), or the
//! poll timeout. Requests submitted during a transfer stay queued in the
//! command channel until the worker is idle again, so completions are FIFO.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::core::channel::{CommandReceiver, FetchRequest, WakeSender};
use crate::core::error::AppError;
use crate::core::response_log::{LogError, LogWriter, ResponseSlot};
use crate::core::shutdown::ShutdownFlag;
use crate::network::transport::{TransferError, Transport};

/// Errors that stop the worker. Individual transfer failures are not here.
#[derive(Debug)]
pub enum WorkerError {
    /// The async runtime could not be created.
    Runtime(io::Error),
    /// The response log ran out of slots.
    Log(LogError),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::Runtime(e) => write!(f, "runtime setup failed: {e}"),
            WorkerError::Log(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for WorkerError {}

impl From<LogError> for WorkerError {
    fn from(e: LogError) -> Self {
        WorkerError::Log(e)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub started: usize,
    /// Finished transfers, successful or not.
    pub completed: usize,
    pub failed: usize,
}

/// Returned by the worker thread. Hands the command receiver back so queued
/// requests can be reclaimed even after a fatal error.
#[derive(Debug)]
pub struct WorkerExit {
    pub commands: CommandReceiver,
    pub stats: WorkerStats,
    pub result: Result<(), WorkerError>,
}

pub struct WorkerHandle {
    thread: JoinHandle<WorkerExit>,
}

impl WorkerHandle {
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn join(self) -> Result<WorkerExit, AppError> {
        self.thread.join().map_err(|_| AppError::WorkerPanicked)
    }
}

type TransferFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>, TransferError>> + Send>>;

struct Transfer {
    url: String,
    slot: usize,
    started_at: Instant,
    body: TransferFuture,
}

enum State {
    Idle,
    Transferring(Transfer),
}

/// Resolves when the in-flight transfer does; never resolves while idle.
async fn completion(state: &mut State) -> Result<Vec<u8>, TransferError> {
    match state {
        State::Transferring(transfer) => (&mut transfer.body).await,
        State::Idle => std::future::pending().await,
    }
}

pub struct NetworkWorker {
    transport: Arc<dyn Transport>,
    commands: CommandReceiver,
    log: LogWriter,
    wake: WakeSender,
    shutdown: Arc<ShutdownFlag>,
    poll_timeout: Duration,
    stats: WorkerStats,
}

impl NetworkWorker {
    pub fn new(
        transport: Arc<dyn Transport>,
        commands: CommandReceiver,
        log: LogWriter,
        wake: WakeSender,
        shutdown: Arc<ShutdownFlag>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            commands,
            log,
            wake,
            shutdown,
            poll_timeout,
            stats: WorkerStats::default(),
        }
    }

    /// Start the worker on a dedicated thread.
    pub fn spawn(self) -> io::Result<WorkerHandle> {
        let thread = thread::Builder::new()
            .name("network-worker".to_string())
            .spawn(move || self.run_to_exit())?;
        Ok(WorkerHandle { thread })
    }

    fn run_to_exit(mut self) -> WorkerExit {
        info!(
            "Network worker started (transport={}, poll timeout={:?})",
            self.transport.name(),
            self.poll_timeout
        );
        let result = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.run()),
            Err(e) => Err(WorkerError::Runtime(e)),
        };
        match &result {
            Ok(()) => info!("Network worker stopped"),
            Err(e) => error!("Network worker failed: {}", e),
        }
        WorkerExit {
            commands: self.commands,
            stats: self.stats,
            result,
        }
    }

    async fn run(&mut self) -> Result<(), WorkerError> {
        let mut state = State::Idle;
        loop {
            if self.shutdown.is_requested() {
                if let State::Transferring(transfer) = &state {
                    info!("Dropping in-flight transfer of {} on shutdown", transfer.url);
                }
                return Ok(());
            }

            let transferring = matches!(state, State::Transferring(_));
            tokio::select! {
                biased;
                () = self.shutdown.wait() => {
                    debug!("Worker woken for shutdown");
                }
                outcome = completion(&mut state), if transferring => {
                    if let State::Transferring(transfer) = std::mem::replace(&mut state, State::Idle) {
                        self.complete(transfer, outcome)?;
                    }
                }
                request = self.commands.receive(), if !transferring => match request {
                    Some(request) => state = State::Transferring(self.start(request)?),
                    None => {
                        info!("Command channel closed, worker stopping");
                        return Ok(());
                    }
                },
                () = tokio::time::sleep(self.poll_timeout) => {
                    debug!("Worker wait timed out (transferring={})", transferring);
                }
            }
        }
    }

    fn start(&mut self, request: FetchRequest) -> Result<Transfer, WorkerError> {
        let slot = self.log.reserve()?;
        let FetchRequest { url } = request;
        info!("Starting transfer of {} into slot {}", url, slot);
        self.stats.started += 1;

        let transport = self.transport.clone();
        let fetch_url = url.clone();
        let body: TransferFuture = Box::pin(async move {
            let mut sink = Vec::new();
            transport.fetch(&fetch_url, &mut sink).await?;
            Ok(sink)
        });

        Ok(Transfer {
            url,
            slot,
            started_at: Instant::now(),
            body,
        })
    }

    fn complete(
        &mut self,
        transfer: Transfer,
        outcome: Result<Vec<u8>, TransferError>,
    ) -> Result<(), WorkerError> {
        self.stats.completed += 1;
        let slot = match outcome {
            Ok(body) => ResponseSlot::succeeded(body),
            Err(e) => {
                warn!("Transfer of {} failed: {}", transfer.url, e);
                self.stats.failed += 1;
                ResponseSlot::failed()
            }
        };
        let len = slot.len();
        let index = self.log.publish(slot)?;
        debug_assert_eq!(index, transfer.slot);
        info!(
            "Published slot {} ({} bytes) for {} after {}ms",
            index,
            len,
            transfer.url,
            transfer.started_at.elapsed().as_millis()
        );
        self.wake.signal();
        Ok(())
    }
}
