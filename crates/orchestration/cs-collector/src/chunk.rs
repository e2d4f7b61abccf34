//! Chunked persistence of record sequences.
//!
//! Records are buffered per grouping key and flushed in chunks of at most
//! `chunk_size` records. Each chunk is written to a temporary file in the
//! output directory and atomically renamed to its final name, so a failure
//! never leaves a truncated artifact behind under a real name.
//!
//! Artifact names are `<key>-<start>-<end>.<ext>` with 1-based inclusive
//! record indices, e.g. `orders-1-1000.txt`, `orders-1001-2000.txt`,
//! `orders-2001-2500.txt`.

use cs_error::{ChunkError, SourceError};
use cs_types::{Artifact, Record};
use futures::{Stream, StreamExt, pin_mut};
use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::ChunkConfig;

/// Used when a grouping key sanitizes to nothing.
const FALLBACK_KEY: &str = "records";

/// A chunk that could not be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChunk {
    /// Name the artifact would have had
    pub name: String,

    /// 1-based index of the first record in the chunk
    pub start_index: usize,

    /// 1-based index of the last record in the chunk
    pub end_index: usize,

    /// Why the chunk was skipped
    pub reason: String,
}

impl SkippedChunk {
    /// Number of records lost with this chunk.
    pub fn record_count(&self) -> usize {
        self.end_index + 1 - self.start_index
    }
}

/// Outcome of writing one grouping key's records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Finalized artifacts, in record order
    pub artifacts: Vec<Artifact>,

    /// Chunks that failed to persist, in record order
    pub skipped: Vec<SkippedChunk>,
}

impl WriteReport {
    /// Records that reached a finalized artifact.
    pub fn records_written(&self) -> usize {
        self.artifacts.iter().map(Artifact::record_count).sum()
    }

    /// Records offered to the writer, persisted or not.
    pub fn records_seen(&self) -> usize {
        self.records_written() + self.skipped.iter().map(SkippedChunk::record_count).sum::<usize>()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: WriteReport) {
        self.artifacts.extend(other.artifacts);
        self.skipped.extend(other.skipped);
    }
}

/// Strip a grouping key down to `[A-Za-z0-9_\s-]`.
///
/// `/aws/lambda/ingest/2024/03/01[$LATEST]abc` becomes
/// `awslambdaingest20240301LATESTabc`.
pub fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        FALLBACK_KEY.to_string()
    } else {
        cleaned
    }
}

/// A record stream that failed after some of its chunks were finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptedWrite {
    /// Chunks finalized (or skipped) before the failure
    pub report: WriteReport,

    /// The source failure that stopped the stream
    pub error: SourceError,
}

/// Writes record sequences as bounded, atomically finalized artifacts.
///
/// One writer is used per run; it remembers every name it has issued so two
/// chunks of the same run never share an artifact.
#[derive(Debug)]
pub struct ChunkWriter {
    dir: PathBuf,
    config: ChunkConfig,
    issued: HashSet<String>,
}

impl ChunkWriter {
    /// Create a writer for `dir`, creating the directory if absent.
    pub fn new(dir: impl Into<PathBuf>, config: ChunkConfig) -> Result<Self, ChunkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| ChunkError::Directory {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            dir,
            config,
            issued: HashSet::new(),
        })
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `records` for `grouping_key`.
    ///
    /// Chunk failures are logged and reported in [`WriteReport::skipped`];
    /// they never stop the remaining chunks.
    pub fn write(
        &mut self,
        grouping_key: &str,
        records: impl IntoIterator<Item = Record>,
    ) -> WriteReport {
        let mut report = WriteReport::default();
        let mut buffer = Vec::with_capacity(self.config.chunk_size);
        let mut next_index = 1;

        for record in records {
            buffer.push(record);
            if buffer.len() == self.config.chunk_size {
                self.flush(grouping_key, next_index, &mut buffer, &mut report);
                next_index += self.config.chunk_size;
            }
        }

        if !buffer.is_empty() {
            self.flush(grouping_key, next_index, &mut buffer, &mut report);
        }

        report
    }

    /// Write a fallible record stream for `grouping_key`, flushing each chunk as
    /// soon as it fills.
    ///
    /// A stream error stops writing. The records buffered for the unfinished
    /// chunk are discarded; chunks already finalized stay on disk and are
    /// returned with the error in [`InterruptedWrite`].
    pub async fn write_stream<S>(
        &mut self,
        grouping_key: &str,
        records: S,
    ) -> Result<WriteReport, InterruptedWrite>
    where
        S: Stream<Item = Result<Record, SourceError>>,
    {
        pin_mut!(records);

        let mut report = WriteReport::default();
        let mut buffer = Vec::with_capacity(self.config.chunk_size);
        let mut next_index = 1;

        while let Some(record) = records.next().await {
            let record = match record {
                Ok(record) => record,
                Err(error) => {
                    if !report.artifacts.is_empty() {
                        warn!(
                            key = grouping_key,
                            artifacts = report.artifacts.len(),
                            discarded = buffer.len(),
                            "Source failed after chunks were finalized"
                        );
                    }
                    return Err(InterruptedWrite { report, error });
                }
            };

            buffer.push(record);
            if buffer.len() == self.config.chunk_size {
                self.flush(grouping_key, next_index, &mut buffer, &mut report);
                next_index += self.config.chunk_size;
            }
        }

        if !buffer.is_empty() {
            self.flush(grouping_key, next_index, &mut buffer, &mut report);
        }

        Ok(report)
    }

    fn flush(
        &mut self,
        grouping_key: &str,
        start_index: usize,
        buffer: &mut Vec<Record>,
        report: &mut WriteReport,
    ) {
        let end_index = start_index + buffer.len() - 1;
        let name = self.issue_name(grouping_key, start_index, end_index);

        match self.persist(&name, buffer) {
            Ok(path) => {
                debug!(artifact = %path.display(), records = buffer.len(), "Chunk finalized");
                report.artifacts.push(Artifact {
                    path,
                    grouping_key: grouping_key.to_string(),
                    start_index,
                    end_index,
                });
            }
            Err(e) => {
                warn!(artifact = %name, error = %e, "File is skipped");
                report.skipped.push(SkippedChunk {
                    name,
                    start_index,
                    end_index,
                    reason: e.to_string(),
                });
            }
        }

        buffer.clear();
    }

    /// Pick a name for the chunk that no earlier chunk of this run received.
    fn issue_name(&mut self, grouping_key: &str, start_index: usize, end_index: usize) -> String {
        let stem = format!("{}-{}-{}", sanitize_key(grouping_key), start_index, end_index);
        let ext = &self.config.extension;

        let mut name = format!("{stem}.{ext}");
        let mut suffix = 2;
        while self.issued.contains(&name) {
            name = format!("{stem}-{suffix}.{ext}");
            suffix += 1;
        }

        self.issued.insert(name.clone());
        name
    }

    fn persist(&self, name: &str, records: &[Record]) -> Result<PathBuf, ChunkError> {
        let final_path = self.dir.join(name);

        let temp = NamedTempFile::new_in(&self.dir).map_err(|e| ChunkError::Write {
            artifact: name.to_string(),
            reason: format!("Failed to create temporary file: {e}"),
        })?;
        let mut writer = BufWriter::new(temp);

        for record in records {
            let line = record.to_line().map_err(|e| ChunkError::Serialize {
                artifact: name.to_string(),
                reason: e.to_string(),
            })?;
            writeln!(writer, "{line}").map_err(|e| ChunkError::Write {
                artifact: name.to_string(),
                reason: e.to_string(),
            })?;
        }

        let temp = writer.into_inner().map_err(|e| ChunkError::Write {
            artifact: name.to_string(),
            reason: format!("Failed to flush buffer: {}", e.error()),
        })?;

        // Dropping the temp file on error removes it
        temp.persist(&final_path).map_err(|e| ChunkError::Finalize {
            artifact: name.to_string(),
            reason: e.error.to_string(),
        })?;

        Ok(final_path)
    }
}
