//! Error types for the shardscope engine

use crate::topology::AddressingMode;

/// All errors that can occur while building an inspection report.
///
/// Only [`ScopeError::MixedAddressing`] and [`ScopeError::MissingVersion`] abort a
/// snapshot; the rest are reported by collaborators and degrade to empty results.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// Chunk groups mix namespace-id and binary-key addressing within one snapshot
    #[error("Mixed chunk addressing: snapshot uses {expected} but a chunk on shard '{shard}' uses {found}")]
    MixedAddressing {
        /// Mode decided from the probe chunk
        expected: AddressingMode,
        /// Mode of the offending chunk group
        found: AddressingMode,
        /// Shard the offending chunk group belongs to
        shard: String,
    },
    /// Neither the snapshot nor the caller supplied a cluster version
    #[error("Mongo version is required, supply it with --mongo-version <version>")]
    MissingVersion,
    /// The version advisory table could not be loaded
    #[error("Advisory table unavailable: {0}")]
    AdvisoryUnavailable(String),
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, ScopeError>;
