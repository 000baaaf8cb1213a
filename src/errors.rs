//! Error types for the resource index and the native catalog.
//!
//! None of these escape the public operations of `ResourceIndex` or
//! `NativeCatalog`: they are logged at the operation boundary and replaced by
//! the operation's degraded default (empty manifest, empty buckets, `Unknown`
//! classification).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while discovering resources or expanding manifest patterns.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid script pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("manifest path {0:?} has no parent directory")]
    NoResourceRoot(PathBuf),

    #[error("blocking scan task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Failures while loading native descriptors for a game.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid game identifier {0:?}")]
    InvalidGame(String),

    #[error("no native data found for game {game:?} in {searched} location(s)")]
    NotFound { game: String, searched: usize },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
