//! Fatal errors that end the program.
//!
//! Failures of a single transfer never get here: they are recorded as a failed
//! response slot. Everything in `AppError` means an invariant broke (log full,
//! channel gone, worker crashed) and the top-level loop shuts down.

use std::fmt;
use std::io;

use crate::core::channel::ChannelError;
use crate::core::config::ConfigError;
use crate::core::response_log::LogError;
use crate::network::transport::TransferError;
use crate::network::worker::WorkerError;

#[derive(Debug)]
pub enum AppError {
    /// Terminal or thread I/O failed.
    Io(io::Error),
    /// The ratatui backend failed to draw.
    Terminal(String),
    Config(ConfigError),
    Channel(ChannelError),
    Log(LogError),
    /// The HTTP client could not be built.
    Transport(TransferError),
    Worker(WorkerError),
    /// The worker thread panicked instead of returning.
    WorkerPanicked,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(e) => write!(f, "I/O error: {e}"),
            AppError::Terminal(msg) => write!(f, "terminal error: {msg}"),
            AppError::Config(e) => write!(f, "{e}"),
            AppError::Channel(e) => write!(f, "{e}"),
            AppError::Log(e) => write!(f, "{e}"),
            AppError::Transport(e) => write!(f, "{e}"),
            AppError::Worker(e) => write!(f, "network worker failed: {e}"),
            AppError::WorkerPanicked => write!(f, "network worker panicked"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        AppError::Io(e)
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<ChannelError> for AppError {
    fn from(e: ChannelError) -> Self {
        AppError::Channel(e)
    }
}

impl From<LogError> for AppError {
    fn from(e: LogError) -> Self {
        AppError::Log(e)
    }
}

impl From<TransferError> for AppError {
    fn from(e: TransferError) -> Self {
        AppError::Transport(e)
    }
}

impl From<WorkerError> for AppError {
    fn from(e: WorkerError) -> Self {
        AppError::Worker(e)
    }
}
