//! cs-collector - paginated collection, chunked persistence and upload.
//!
//! This crate implements the scan-chunk-upload pipeline shared by every
//! resource type cloudsweep collects:
//!
//! - [`paginate`] and [`drain`] turn paginated or streaming sources into one
//!   lazy sequence of records
//! - [`ChunkWriter`] persists that sequence as bounded, atomically finalized
//!   artifacts
//! - [`upload`] transfers finished artifacts to a bucket, tolerating per-file
//!   failures
//! - [`Orchestrator`] wires the three together per resource type
//! - [`aws`] adapts the AWS SDK clients to the source and store traits
//!
//! Everything runs sequentially: each fetch, write and upload completes before
//! the next begins.
//!
//! # Example
//!
//! ```ignore
//! use cs_collector::{CollectorConfig, Orchestrator};
//! use cs_collector::aws::{AwsConfig, DynamoCatalog, load_sdk_config};
//!
//! let sdk_config = load_sdk_config(&AwsConfig::default()).await;
//! let catalog = DynamoCatalog::new(aws_sdk_dynamodb::Client::new(&sdk_config));
//!
//! let orchestrator = Orchestrator::new(CollectorConfig::new());
//! let mut report = orchestrator.run_table(&catalog, Some("orders")).await?;
//! orchestrator.finish(&mut report).await;
//!
//! eprintln!("Wrote {} artifacts", report.artifacts.len());
//! if let Some(error) = &report.failure {
//!     eprintln!("Run ended early: {error}");
//! }
//! ```

pub mod aws;
pub mod chunk;
pub mod config;
pub mod orchestrator;
pub mod paginator;
pub mod stats;
pub mod upload;

pub use chunk::{ChunkWriter, InterruptedWrite, SkippedChunk, WriteReport, sanitize_key};
pub use config::{ChunkConfig, CollectorConfig, QueueScanConfig};
pub use orchestrator::{Orchestrator, Phase, RunReport, Uploader, resolve_config};
pub use paginator::{drain, paginate};
pub use stats::CollectionStats;
pub use upload::{UploadOutcome, UploadReport, derive_key, upload};
