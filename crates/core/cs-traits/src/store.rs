//! Upload destination trait.

use async_trait::async_trait;
use cs_error::UploadError;
use std::path::Path;

/// Trait for object storage destinations.
///
/// One call is one transfer attempt; any retrying happens inside the
/// implementation's transport.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `path` to `bucket` under `key`.
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), UploadError>;
}
