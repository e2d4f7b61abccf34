//! Configuration types for collection runs.

use cs_types::DEFAULT_LOOKBACK_HOURS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default number of records per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default cap on records accumulated from a streaming source.
pub const DEFAULT_MAX_QUEUE_RECORDS: usize = 100;

/// Longest long-poll wait the queue service accepts.
pub const MAX_QUEUE_WAIT_SECS: u64 = 20;

/// Default seconds a received message stays hidden from other consumers.
pub const DEFAULT_VISIBILITY_TIMEOUT_SECS: i32 = 120;

/// Configuration for chunked persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum records per chunk (N)
    pub chunk_size: usize,

    /// Artifact file extension, without the dot
    pub extension: String,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            extension: "txt".to_string(),
        }
    }
}

impl ChunkConfig {
    /// Create a chunk configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size. Values below 1 are raised to 1.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the artifact extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// Configuration for draining a streaming source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueScanConfig {
    /// Stop once this many records have been received
    pub max_records: usize,

    /// Long-poll wait per receive
    #[serde(with = "humantime_serde")]
    pub wait_time: Duration,

    /// Records requested per receive (1-10)
    pub batch_size: usize,

    /// Seconds a received message stays hidden from other consumers
    pub visibility_timeout_secs: i32,
}

impl Default for QueueScanConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_QUEUE_RECORDS,
            wait_time: Duration::from_secs(MAX_QUEUE_WAIT_SECS),
            batch_size: 10,
            visibility_timeout_secs: DEFAULT_VISIBILITY_TIMEOUT_SECS,
        }
    }
}

impl QueueScanConfig {
    /// Create a queue scan configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record cap. Values below 1 are raised to 1.
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records.max(1);
        self
    }

    /// Set the long-poll wait, capped at the service maximum.
    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time.min(Duration::from_secs(MAX_QUEUE_WAIT_SECS));
        self
    }

    /// Set the per-receive batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, 10);
        self
    }

    /// Set the visibility timeout.
    pub fn with_visibility_timeout(mut self, seconds: i32) -> Self {
        self.visibility_timeout_secs = seconds.max(0);
        self
    }
}

/// Configuration for a collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Directory under which per-resource output directories are created
    pub base_dir: PathBuf,

    /// Lookback window for log retrieval, in hours
    pub lookback_hours: u32,

    /// Chunking settings
    pub chunk: ChunkConfig,

    /// Streaming source settings
    pub queue: QueueScanConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
            chunk: ChunkConfig::default(),
            queue: QueueScanConfig::default(),
        }
    }
}

impl CollectorConfig {
    /// Create a collector configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base output directory.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Set the log lookback window in hours.
    pub fn with_lookback_hours(mut self, hours: u32) -> Self {
        self.lookback_hours = hours;
        self
    }

    /// Set the chunking configuration.
    pub fn with_chunk(mut self, chunk: ChunkConfig) -> Self {
        self.chunk = chunk;
        self
    }

    /// Set the streaming source configuration.
    pub fn with_queue(mut self, queue: QueueScanConfig) -> Self {
        self.queue = queue;
        self
    }
}
