//! Local IPC: the daemon socket that enforces a single running instance.
//!
//! A second launch connects to the socket and sends `toggle`; the running
//! instance flips its window visibility.

pub mod instance;
pub mod listener;
