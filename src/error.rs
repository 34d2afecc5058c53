// SPDX-License-Identifier: GPL-3.0-only
//! Error types for the brightness controller
//!
//! Internally every operation reports a typed error. The public controller
//! surface converts these back into the degenerate-value / boolean contract
//! (zeroed capabilities, `false` from a write) after logging them.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while resolving the reference monitor's capabilities
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// Monitor handles could not be enumerated
    #[error("Failed to enumerate monitors: {0}")]
    Enumerate(#[source] anyhow::Error),

    /// Enumeration succeeded but returned no monitor
    #[error("No monitor available to query")]
    NoMonitor,

    /// The hardware channel rejected the capability query
    #[error("Capability query failed: {0}")]
    Query(#[source] anyhow::Error),
}

/// Failure somewhere in the hardware-then-software write sequence
#[derive(Error, Debug)]
pub enum WriteError {
    /// Monitor handles could not be enumerated
    #[error("Failed to enumerate monitors: {0}")]
    Enumerate(#[source] anyhow::Error),

    /// Hardware write failed on one monitor; earlier monitors were already written
    #[error("Hardware write failed on monitor {index}: {source}")]
    Monitor {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    /// Software backend write failed after every monitor was written
    #[error("Software backend write failed: {0}")]
    Software(#[source] anyhow::Error),
}

/// Invalid input to level generation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LevelsError {
    /// At least two levels are needed to compute a step
    #[error("Cannot generate {count} level(s): at least 2 are required")]
    TooFewLevels { count: usize },

    #[error("Cannot generate {count} levels: count is too large")]
    TooManyLevels { count: usize },
}

/// Configuration file error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
