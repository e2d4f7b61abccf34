//! Error types and classification for cloudsweep.
//!
//! This crate provides:
//! - [`CsError`] - Top-level error enum for all collection runs
//! - Domain-specific errors ([`SourceError`], [`ChunkError`], [`UploadError`],
//!   [`PolicyError`], [`ConfigError`])
//! - [`ErrorCategory`] for deciding between aborting, skipping and falling back

use thiserror::Error;

/// Top-level error type for cloudsweep.
#[derive(Error, Debug)]
pub enum CsError {
    /// Remote source errors (fetch, enumerate, receive)
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Local chunk persistence errors
    #[error("Chunk error: {0}")]
    Chunk(#[from] ChunkError),

    /// Upload errors
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Policy decomposition errors
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A required target (table name, queue name) was not supplied
    #[error("Missing target: {0}")]
    MissingTarget(String),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised while reading from a remote source.
///
/// Every external call site maps its failure into one of these variants so the
/// orchestrator can tell a missing resource apart from a flaky network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The named resource does not exist. Never retried.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Network or service failure that may succeed on a later run
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The response could not be interpreted
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The source broke the pagination contract (repeated cursor, stalled page)
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),
}

/// Errors raised while persisting a single chunk.
#[derive(Error, Debug)]
pub enum ChunkError {
    /// Output directory could not be created
    #[error("Cannot create output directory {path}: {reason}")]
    Directory { path: String, reason: String },

    /// Temporary file creation or write failed
    #[error("Write failed for {artifact}: {reason}")]
    Write { artifact: String, reason: String },

    /// Record could not be serialized
    #[error("Serialization failed for {artifact}: {reason}")]
    Serialize { artifact: String, reason: String },

    /// Atomic rename to the final artifact name failed
    #[error("Finalize failed for {artifact}: {reason}")]
    Finalize { artifact: String, reason: String },
}

/// Errors raised while uploading a single artifact.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Artifact path does not have a directory and file name to build a key from
    #[error("Cannot derive object key from path: {0}")]
    KeyDerivation(String),

    /// Local artifact could not be read
    #[error("Cannot read artifact {path}: {reason}")]
    Read { path: String, reason: String },

    /// Transfer to the bucket failed
    #[error("Transfer of {key} failed: {reason}")]
    Transfer { key: String, reason: String },
}

/// Errors raised while decomposing policy documents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Action string is not of the form `service:action`
    #[error("Malformed action '{0}': expected 'service:action'")]
    MalformedAction(String),

    /// Statement lacks a required member
    #[error("Malformed statement in '{policy}': {reason}")]
    MalformedStatement { policy: String, reason: String },

    /// Policy document is not valid JSON (after URL decoding)
    #[error("Malformed document '{policy}': {reason}")]
    MalformedDocument { policy: String, reason: String },

    /// Filter pattern could not be compiled
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration file exists but is not valid JSON
    #[error("Error parsing config file {path}: {reason}")]
    Malformed { path: String, reason: String },

    /// Configuration file could not be opened
    #[error("Error opening config file {path}: {reason}")]
    Unreadable { path: String, reason: String },

    /// Configuration key absent or of the wrong type
    #[error("Config key '{key}' unusable: {reason}")]
    Key { key: String, reason: String },
}

/// How an error affects the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Terminate before any work begins
    ///
    /// Examples: malformed configuration JSON
    FatalAtStartup,

    /// Abort this resource type's run, report, continue to process exit
    ///
    /// Examples: table not found, missing queue name, stalled pagination
    FatalPerResource,

    /// Log and skip the item, the batch continues
    ///
    /// Examples: one chunk failed to write, one upload failed
    RecoverablePerItem,

    /// Substitute a default and proceed
    ///
    /// Examples: config file missing, config key missing
    SilentFallback,
}

/// Classifies an error according to the run's error taxonomy.
pub fn classify_error(error: &CsError) -> ErrorCategory {
    match error {
        CsError::Source(_) => ErrorCategory::FatalPerResource,
        CsError::MissingTarget(_) => ErrorCategory::FatalPerResource,
        CsError::Chunk(ChunkError::Directory { .. }) => ErrorCategory::FatalPerResource,
        CsError::Chunk(_) => ErrorCategory::RecoverablePerItem,
        CsError::Upload(_) => ErrorCategory::RecoverablePerItem,
        CsError::Policy(PolicyError::InvalidPattern { .. }) => ErrorCategory::FatalAtStartup,
        CsError::Policy(_) => ErrorCategory::RecoverablePerItem,
        CsError::Config(e) => classify_config_error(e),
        CsError::Other(_) => ErrorCategory::FatalPerResource,
    }
}

fn classify_config_error(error: &ConfigError) -> ErrorCategory {
    match error {
        ConfigError::Malformed { .. } => ErrorCategory::FatalAtStartup,
        ConfigError::Unreadable { .. } => ErrorCategory::SilentFallback,
        ConfigError::Key { .. } => ErrorCategory::SilentFallback,
    }
}

impl SourceError {
    /// Whether a later attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }
}
