//! GitSentry server library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `gitsentry-server` is used as a binary (main.rs).

pub mod cli;
pub mod coordinator;
pub mod handlers;
pub mod logging;
pub mod metrics_server;
pub mod registry;
