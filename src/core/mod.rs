//! # Core
//!
//! Everything the two threads share, plus the UI's pure state logic.
//! It does not touch the terminal or the HTTP client.
//!
//! ```text
//!        UI thread                                 network worker
//!   ┌──────────────────┐    CommandSender     ┌──────────────────┐
//!   │ Session + update │ ───FetchRequest────► │ Transport driver │
//!   │                  │                      │                  │
//!   │      redraw      │ ◄──────wake───────── │     publish      │
//!   └────────┬─────────┘    WakeSender        └────────┬─────────┘
//!            │ read(i) for i < published               │ write slot, then
//!            └──────────────► ResponseLog ◄────────────┘ advance cursor
//! ```
//!
//! ## Modules
//!
//! - [`action`]: `Key`, `Effect` and the `update()` reducer
//! - [`channel`]: command and wake channels
//! - [`config`]: config file, env and CLI resolution
//! - [`error`]: fatal error taxonomy
//! - [`response_log`]: append-only log with a publish cursor
//! - [`shutdown`]: shutdown flag and coordinator
//! - [`state`]: the UI-owned `Session`

pub mod action;
pub mod channel;
pub mod config;
pub mod error;
pub mod response_log;
pub mod shutdown;
pub mod state;
