//! Csvpilot CLI wiring
//!
//! The library half of the root package: configuration, logging,
//! selector catalog, debug snapshots, reporting, and the application
//! run loop. All orchestration semantics live in the workspace crates;
//! this crate only assembles them.

pub mod app;
pub mod cli;
pub mod config;
pub mod report;
pub mod selectors;
pub mod snapshot;

pub use cli::Cli;
pub use config::{AppConfig, ConfigError, RuntimeSettings};
