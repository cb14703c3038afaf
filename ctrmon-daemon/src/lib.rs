//! ctrmon daemon library.
//!
//! Exposes the daemon's building blocks for integration testing.
//! In production, `ctrmon` is used as a binary (main.rs).

pub mod cli;
pub mod logging;
pub mod signals;
pub mod supervisor;
