//! S3 artifact store.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_types::error::display::DisplayErrorContext;
use cs_error::UploadError;
use cs_traits::ObjectStore;
use std::path::Path;
use tracing::debug;

/// Uploads artifacts with a single `PutObject` each.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), UploadError> {
        let body = ByteStream::from_path(path).await.map_err(|e| UploadError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::Transfer {
                key: key.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(bucket, key, "Uploaded");
        Ok(())
    }
}
