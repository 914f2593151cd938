//! Host-side collaborators for the consensus engine
//!
//! - `conversation_log`: append-only JSONL conversation log
//! - `fitness_store`: fitness priors persisted between runs
//! - `snapshot`: snapshot provider driven by CLI flags and the environment
//! - `output`: text and JSON rendering of results

pub mod conversation_log;
pub mod fitness_store;
pub mod output;
pub mod snapshot;

use std::path::PathBuf;

/// Error type for host file operations
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for host file operations
pub type HostResult<T> = Result<T, HostError>;

pub use conversation_log::JsonlConversationLog;
pub use output::{render, OutputFormat};
pub use snapshot::{EnvModeProvider, HostSnapshotProvider};
