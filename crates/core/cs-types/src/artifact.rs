//! Finalized local artifacts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A chunk that has been atomically persisted to local disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Final location of the artifact
    pub path: PathBuf,

    /// Grouping key the chunk belongs to (unsanitized)
    pub grouping_key: String,

    /// 1-based index of the first record in the chunk
    pub start_index: usize,

    /// 1-based index of the last record in the chunk (inclusive)
    pub end_index: usize,
}

impl Artifact {
    /// Number of records in the artifact.
    pub fn record_count(&self) -> usize {
        self.end_index + 1 - self.start_index
    }

    /// File name portion of the path.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}
