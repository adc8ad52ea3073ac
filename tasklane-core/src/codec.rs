//! Snapshot serialization for persisted task tables.
//!
//! A [`TaskSnapshot`] captures the full table plus the id counter so that
//! a repository can be restored without reusing identifiers. Encoding uses
//! postcard; a leading format version guards against reading snapshots
//! written by an incompatible layout.

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Error type for snapshot encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The snapshot was written by an unsupported format version.
    #[error("unsupported snapshot version {found} (expected {SNAPSHOT_VERSION})")]
    UnsupportedVersion {
        /// Version found in the snapshot.
        found: u8,
    },
}

/// Full contents of a task table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Format version, always [`SNAPSHOT_VERSION`] when written.
    pub version: u8,
    /// The next identifier the repository will assign.
    pub next_id: u64,
    /// Every stored task, in id order.
    pub tasks: Vec<Task>,
}

impl TaskSnapshot {
    /// Builds a snapshot at the current format version.
    #[must_use]
    pub const fn new(next_id: u64, tasks: Vec<Task>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            next_id,
            tasks,
        }
    }
}

/// Encodes a [`TaskSnapshot`] into bytes using postcard.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the snapshot cannot be serialized.
pub fn encode_snapshot(snapshot: &TaskSnapshot) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(snapshot).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a [`TaskSnapshot`] from bytes using postcard.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the bytes cannot be deserialized,
/// or `CodecError::UnsupportedVersion` if the version does not match.
pub fn decode_snapshot(bytes: &[u8]) -> Result<TaskSnapshot, CodecError> {
    let snapshot: TaskSnapshot =
        postcard::from_bytes(bytes).map_err(|e| CodecError::Serialization(e.to_string()))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: snapshot.version,
        });
    }
    Ok(snapshot)
}
