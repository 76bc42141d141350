//! Fetchlog: type a URL, fetch it on a background worker, and read every
//! response in a scrolling terminal log.

pub mod core;
pub mod network;
pub mod tui;

#[cfg(test)]
pub mod test_support;
