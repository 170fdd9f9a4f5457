//! Shared types, error model, and configuration for PacketPress.
//!
//! This crate is the foundation depended on by all other PacketPress crates.
//! It provides:
//! - [`PacketPressError`] — the unified error type
//! - Boundary value types ([`FileIndexEntry`], [`SlotResult`],
//!   [`AssemblyReport`], [`ProgressUpdate`], [`RunId`])
//! - Configuration ([`AppConfig`], [`RunOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ManifestRegistryEntry, RunOptions, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{PacketPressError, Result};
pub use types::{
    AssemblyReport, FileIndexEntry, ProgressUpdate, RunId, SlotResult, SlotStatus,
};
