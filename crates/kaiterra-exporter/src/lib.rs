//! Kaiterra exporter library.
//!
//! Re-exports the router, shared state, and upstream client so they can be
//! driven by integration tests without binding a socket.

pub mod api;
pub mod config;
pub mod fetcher;
pub mod process;
pub mod state;
