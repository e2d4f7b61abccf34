//! Per-resource-type run orchestration.
//!
//! A run moves through
//! `Init -> ResolveConfig -> Fetch -> Persist -> [Present] -> [Upload] -> Done`.
//!
//! - `ResolveConfig` happens once per process, before clients are built, via
//!   [`resolve_config`]; only malformed configuration is fatal.
//! - `Fetch` and `Persist` are one `run_*` call. Chunks are flushed while the
//!   source is still being read, so memory stays bounded by one chunk.
//! - `Present` is the caller's business; it marks the report with
//!   [`RunReport::enter`] while printing.
//! - [`Orchestrator::finish`] performs `Upload` when a destination was supplied
//!   and closes the run.
//!
//! A source failure aborts the rest of the run but not the report: the
//! failure is kept in [`RunReport::failure`] next to the chunks finalized
//! before it, which are still presented and uploaded.

use cs_error::{ConfigError, CsError, SourceError};
use cs_traits::{LogCatalog, ObjectStore, QueueCatalog, TableCatalog};
use cs_types::{Artifact, RegionSetting, ResourceKind, TimeWindow};
use futures::TryStreamExt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::chunk::{ChunkWriter, InterruptedWrite, SkippedChunk, WriteReport};
use crate::config::CollectorConfig;
use crate::paginator::{drain, paginate};
use crate::stats::CollectionStats;
use crate::upload::{UploadReport, upload};

/// Stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    ResolveConfig,
    Fetch,
    Persist,
    Present,
    Upload,
    Done,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "Init"),
            Self::ResolveConfig => write!(f, "ResolveConfig"),
            Self::Fetch => write!(f, "Fetch"),
            Self::Persist => write!(f, "Persist"),
            Self::Present => write!(f, "Present"),
            Self::Upload => write!(f, "Upload"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// Resolve the log region, entering the `ResolveConfig` phase.
///
/// A missing file or key falls back to [`RegionSetting::Unknown`]; malformed
/// JSON is returned as an error and should stop the process before any work.
pub fn resolve_config(path: impl AsRef<Path>) -> Result<RegionSetting, ConfigError> {
    debug!(phase = %Phase::ResolveConfig, path = %path.as_ref().display(), "Entering phase");
    let region = cs_types::resolve_region(path)?;
    debug!(region = %region, "Resolved log region");
    Ok(region)
}

/// Upload destination for finished artifacts.
pub struct Uploader {
    store: Box<dyn ObjectStore>,
    bucket: String,
}

impl Uploader {
    /// Create an uploader targeting `bucket`.
    pub fn new(store: impl ObjectStore + 'static, bucket: impl Into<String>) -> Self {
        Self {
            store: Box::new(store),
            bucket: bucket.into(),
        }
    }

    /// Destination bucket.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Resource type of the run
    pub kind: ResourceKind,

    /// Target name, when one was selected
    pub target: Option<String>,

    /// Last phase entered
    pub phase: Phase,

    /// Finalized artifacts, in write order
    pub artifacts: Vec<Artifact>,

    /// Chunks that failed to persist
    pub skipped: Vec<SkippedChunk>,

    /// Log groups visited (logs runs only)
    pub groups: Vec<String>,

    /// Upload results, when an upload destination was supplied
    pub uploads: Option<UploadReport>,

    /// Counters and collected messages
    pub stats: CollectionStats,

    /// Source failure that ended the run early
    pub failure: Option<SourceError>,
}

impl RunReport {
    fn new(kind: ResourceKind, target: Option<&str>) -> Self {
        Self {
            kind,
            target: target.map(str::to_string),
            phase: Phase::Init,
            artifacts: Vec::new(),
            skipped: Vec::new(),
            groups: Vec::new(),
            uploads: None,
            stats: CollectionStats::new(),
            failure: None,
        }
    }

    /// Move the run to `phase`.
    pub fn enter(&mut self, phase: Phase) {
        debug!(kind = %self.kind, from = %self.phase, to = %phase, "Entering phase");
        self.phase = phase;
    }

    /// Whether a source failure ended the run early.
    pub fn is_aborted(&self) -> bool {
        self.failure.is_some()
    }

    fn absorb(&mut self, written: WriteReport) {
        self.stats.record_write(&written);
        self.artifacts.extend(written.artifacts);
        self.skipped.extend(written.skipped);
    }

    fn absorb_stream(&mut self, written: Result<WriteReport, InterruptedWrite>) -> Result<(), SourceError> {
        match written {
            Ok(report) => {
                self.absorb(report);
                Ok(())
            }
            Err(InterruptedWrite { report, error }) => {
                self.absorb(report);
                Err(error)
            }
        }
    }

    fn fail(&mut self, error: SourceError) {
        warn!(kind = %self.kind, artifacts = self.artifacts.len(), error = %error, "Run aborted");
        self.stats.record_error(&error);
        self.failure = Some(error);
    }
}

/// Wires sources, the chunk writer and the optional uploader for each
/// resource type.
pub struct Orchestrator {
    config: CollectorConfig,
    uploader: Option<Uploader>,
}

impl Orchestrator {
    /// Create an orchestrator without an upload destination.
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            uploader: None,
        }
    }

    /// Upload finished artifacts through `uploader`.
    pub fn with_uploader(mut self, uploader: Uploader) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Run configuration.
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    fn writer(&self, kind: ResourceKind) -> Result<ChunkWriter, CsError> {
        let dir = self.config.base_dir.join(kind.output_dir());
        Ok(ChunkWriter::new(dir, self.config.chunk.clone())?)
    }

    /// Collect log events of the last `lookback_hours` hours.
    ///
    /// With `group` set only that group is read; otherwise every group is
    /// enumerated. Each stream is written under the key `<group>/<stream>`;
    /// streams without events in the window produce no artifact. Every stream
    /// is read with the same window.
    pub async fn run_logs<C: LogCatalog>(
        &self,
        catalog: &C,
        group: Option<&str>,
    ) -> Result<RunReport, CsError> {
        let mut report = RunReport::new(ResourceKind::Logs, group);
        report.enter(Phase::Fetch);
        info!("Collecting CloudWatch logs...");

        let window = TimeWindow::lookback(self.config.lookback_hours);
        let mut writer = self.writer(ResourceKind::Logs)?;

        if let Err(error) = collect_logs(catalog, group, window, &mut writer, &mut report).await {
            report.fail(error);
        }

        self.persisted(&mut report, &writer);
        Ok(report)
    }

    /// Scan every item of `table`.
    ///
    /// A missing table name is an error: scanning is never implicit.
    pub async fn run_table<C: TableCatalog>(
        &self,
        catalog: &C,
        table: Option<&str>,
    ) -> Result<RunReport, CsError> {
        let table = table.ok_or_else(|| {
            CsError::MissingTarget("Please specify a table name.".to_string())
        })?;

        let mut report = RunReport::new(ResourceKind::Table, Some(table));
        report.enter(Phase::Fetch);
        info!(table, "Scanning the table...");

        let mut writer = self.writer(ResourceKind::Table)?;
        let scan = catalog.scan(table);
        let written = writer.write_stream(table, paginate(&scan, None)).await;
        if let Err(error) = report.absorb_stream(written) {
            report.fail(error);
        }

        self.persisted(&mut report, &writer);
        Ok(report)
    }

    /// Receive messages from `queue` until it runs dry or the cap is reached.
    ///
    /// Messages are not deleted: they become visible again after the
    /// visibility timeout and a later run may read them again.
    pub async fn run_queue<C: QueueCatalog>(
        &self,
        catalog: &C,
        queue: Option<&str>,
    ) -> Result<RunReport, CsError> {
        let queue = queue.ok_or_else(|| {
            CsError::MissingTarget("Please specify a queue name.".to_string())
        })?;

        let mut report = RunReport::new(ResourceKind::Queue, Some(queue));
        report.enter(Phase::Fetch);
        info!(queue, max = self.config.queue.max_records, "Receiving messages...");

        let receiver = match catalog.open(queue).await {
            Ok(receiver) => receiver,
            Err(error) => {
                report.fail(error);
                return Ok(report);
            }
        };

        let mut writer = self.writer(ResourceKind::Queue)?;
        let written = writer
            .write_stream(queue, drain(&receiver, &self.config.queue))
            .await;
        if let Err(error) = report.absorb_stream(written) {
            report.fail(error);
        }

        self.persisted(&mut report, &writer);
        Ok(report)
    }

    fn persisted(&self, report: &mut RunReport, writer: &ChunkWriter) {
        report.enter(Phase::Persist);
        if !report.skipped.is_empty() {
            warn!(skipped = report.skipped.len(), "Some chunks were not written");
        }
        info!(
            records = report.stats.records_fetched,
            artifacts = report.artifacts.len(),
            dir = %writer.dir().display(),
            "Files written"
        );
    }

    /// Upload the run's artifacts when a destination was supplied, then close
    /// the run.
    ///
    /// Upload failures are recorded in the report and never returned.
    pub async fn finish(&self, report: &mut RunReport) {
        if let Some(uploader) = &self.uploader {
            report.enter(Phase::Upload);
            let uploads = upload(uploader.store.as_ref(), &uploader.bucket, &report.artifacts).await;
            report.stats.record_upload(&uploads);
            report.uploads = Some(uploads);
        }

        report.enter(Phase::Done);
        report.stats.complete();
    }
}

/// Enumerate groups and streams and write every stream's events.
async fn collect_logs<C: LogCatalog>(
    catalog: &C,
    group: Option<&str>,
    window: TimeWindow,
    writer: &mut ChunkWriter,
    report: &mut RunReport,
) -> Result<(), SourceError> {
    let groups: Vec<String> = match group {
        Some(group) => vec![group.to_string()],
        None => {
            let source = catalog.groups();
            paginate(&source, None).try_collect().await?
        }
    };
    debug!(groups = groups.len(), start = %window.start, end = %window.end, "Reading log groups");
    report.groups = groups.clone();

    for group in &groups {
        let source = catalog.streams(group);
        let streams: Vec<String> = paginate(&source, None).try_collect().await?;

        for stream in &streams {
            let events = catalog.events(group, stream, window);
            let key = format!("{group}/{stream}");
            let written = writer.write_stream(&key, paginate(&events, None)).await;
            report.absorb_stream(written)?;
        }
    }

    Ok(())
}

