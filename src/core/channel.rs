//! # Channels
//!
//! The two one-directional links between the UI and the network worker.
//!
//! ```text
//!   UI ──(CommandSender)──► FetchRequest queue ──(CommandReceiver)──► worker
//!   UI ◄──(WakeReceiver)─── "something changed" ◄──(WakeSender)────── worker
//! ```
//!
//! The command channel moves owned `FetchRequest` values, FIFO, one producer
//! and one consumer. The wake channel carries no data: its capacity is one,
//! so any number of signals sent before the UI looks collapse into one wake.

use std::fmt;

use log::debug;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

/// A request to fetch one URL. Ownership travels through the command channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The receiving side is gone; the request could not be delivered.
    Closed(FetchRequest),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Closed(request) => {
                write!(f, "command channel closed, dropped request for {}", request.url)
            }
        }
    }
}

impl std::error::Error for ChannelError {}

// ============================================================================
// Command channel
// ============================================================================

pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, CommandReceiver { rx })
}

/// UI-side half of the command channel.
#[derive(Debug)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<FetchRequest>,
}

impl CommandSender {
    /// Hand `request` over to the worker. Never blocks.
    pub fn submit(&self, request: FetchRequest) -> Result<(), ChannelError> {
        debug!("Submitting fetch request for {}", request.url);
        self.tx
            .send(request)
            .map_err(|mpsc::error::SendError(request)| ChannelError::Closed(request))
    }
}

/// Worker-side half of the command channel.
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::UnboundedReceiver<FetchRequest>,
}

impl CommandReceiver {
    /// Take the oldest queued request, if any, without waiting.
    pub fn try_receive(&mut self) -> Option<FetchRequest> {
        match self.rx.try_recv() {
            Ok(request) => Some(request),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next request. `None` once the sender is gone and the
    /// queue is empty.
    pub async fn receive(&mut self) -> Option<FetchRequest> {
        self.rx.recv().await
    }

    /// Drop every request still queued, returning how many there were.
    pub fn reclaim(&mut self) -> usize {
        let mut reclaimed = 0;
        while let Some(request) = self.try_receive() {
            debug!("Reclaiming undelivered request for {}", request.url);
            drop(request);
            reclaimed += 1;
        }
        reclaimed
    }
}

// ============================================================================
// Wake channel
// ============================================================================

/// Outcome of waiting on the wake channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// At least one signal arrived.
    Signalled,
    /// Every sender has been dropped; no further wake can ever arrive.
    Disconnected,
}

pub fn wake_channel() -> (WakeSender, WakeReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (WakeSender { tx }, WakeReceiver { rx })
}

#[derive(Debug, Clone)]
pub struct WakeSender {
    tx: mpsc::Sender<()>,
}

impl WakeSender {
    /// Ask the UI to redraw. Coalesces with any wake already pending.
    pub fn signal(&self) {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Closed(())) => debug!("Wake signal dropped: UI is gone"),
        }
    }
}

#[derive(Debug)]
pub struct WakeReceiver {
    rx: mpsc::Receiver<()>,
}

impl WakeReceiver {
    /// Block until a signal is pending or no sender is left.
    ///
    /// The pending signal is consumed.
    pub async fn wait(&mut self) -> Wake {
        match self.rx.recv().await {
            Some(()) => Wake::Signalled,
            None => Wake::Disconnected,
        }
    }

    /// Discard every pending signal, returning how many were discarded.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        while self.rx.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[test]
    fn test_commands_are_fifo() {
        let (tx, mut rx) = command_channel();
        tx.submit(FetchRequest::new("http://a")).unwrap();
        tx.submit(FetchRequest::new("http://b")).unwrap();
        assert_eq!(rx.try_receive(), Some(FetchRequest::new("http://a")));
        assert_eq!(rx.try_receive(), Some(FetchRequest::new("http://b")));
        assert_eq!(rx.try_receive(), None);
    }

    #[test]
    fn test_try_receive_on_empty_channel_returns_none() {
        let (_tx, mut rx) = command_channel();
        assert_eq!(rx.try_receive(), None);
    }

    #[test]
    fn test_submit_after_receiver_dropped_returns_request() {
        let (tx, rx) = command_channel();
        drop(rx);
        let err = tx.submit(FetchRequest::new("http://lost")).unwrap_err();
        assert_eq!(err, ChannelError::Closed(FetchRequest::new("http://lost")));
    }

    #[test]
    fn test_reclaim_counts_and_empties_queue() {
        let (tx, mut rx) = command_channel();
        for i in 0..5 {
            tx.submit(FetchRequest::new(format!("http://host/{i}"))).unwrap();
        }
        assert_eq!(rx.reclaim(), 5);
        assert_eq!(rx.reclaim(), 0);
        assert_eq!(rx.try_receive(), None);
    }

    #[test]
    fn test_reclaim_after_sender_dropped() {
        let (tx, mut rx) = command_channel();
        tx.submit(FetchRequest::new("http://a")).unwrap();
        drop(tx);
        assert_eq!(rx.reclaim(), 1);
    }

    #[test]
    fn test_wake_signals_coalesce() {
        let (tx, mut rx) = wake_channel();
        tx.signal();
        tx.signal();
        tx.clone().signal();
        assert_eq!(rx.drain(), 1);
        assert_eq!(rx.drain(), 0);
    }

    #[test]
    fn test_wake_wait_pending_until_signalled() {
        let (tx, mut rx) = wake_channel();
        let mut wait = task::spawn(rx.wait());
        assert_pending!(wait.poll());
        tx.signal();
        assert!(wait.is_woken());
        assert_ready_eq!(wait.poll(), Wake::Signalled);
    }

    #[test]
    fn test_wake_wait_consumes_signal() {
        let (tx, mut rx) = wake_channel();
        tx.signal();
        tx.signal();
        {
            let mut wait = task::spawn(rx.wait());
            assert_ready_eq!(wait.poll(), Wake::Signalled);
        }
        let mut again = task::spawn(rx.wait());
        assert_pending!(again.poll());
    }

    #[test]
    fn test_wake_wait_reports_disconnect() {
        let (tx, mut rx) = wake_channel();
        drop(tx);
        let mut wait = task::spawn(rx.wait());
        assert_ready_eq!(wait.poll(), Wake::Disconnected);
    }

    #[test]
    fn test_signal_after_receiver_dropped_is_harmless() {
        let (tx, rx) = wake_channel();
        drop(rx);
        tx.signal();
    }
}
