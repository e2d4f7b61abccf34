//! Upload of finished artifacts to object storage.

use cs_error::UploadError;
use cs_traits::ObjectStore;
use cs_types::Artifact;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// Outcome of one artifact's upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Local artifact path
    pub path: PathBuf,

    /// Object key, when one could be derived
    pub key: Option<String>,

    /// Transfer result
    pub result: Result<(), UploadError>,
}

/// Per-artifact results of an upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Destination bucket
    pub bucket: String,

    /// One outcome per artifact, in input order
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    /// Number of artifacts uploaded.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// Number of artifacts that failed.
    pub fn failed(&self) -> usize {
        self.failures().count()
    }
}

/// Build the object key from the last two path segments.
///
/// `./scan_results/orders-1-1000.txt` becomes `scan_results/orders-1-1000.txt`.
pub fn derive_key(path: &Path) -> Result<String, UploadError> {
    let segments: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    match segments.as_slice() {
        [.., dir, file] => Ok(format!("{dir}/{file}")),
        _ => Err(UploadError::KeyDerivation(path.display().to_string())),
    }
}

/// Upload every artifact to `bucket`.
///
/// Each artifact gets exactly one attempt. Failures are logged and recorded in
/// the report; they never stop the remaining uploads.
pub async fn upload(store: &dyn ObjectStore, bucket: &str, artifacts: &[Artifact]) -> UploadReport {
    info!(bucket, artifacts = artifacts.len(), "Uploading files...");

    let mut report = UploadReport {
        bucket: bucket.to_string(),
        outcomes: Vec::with_capacity(artifacts.len()),
    };

    for artifact in artifacts {
        let (key, result) = match derive_key(&artifact.path) {
            Ok(key) => {
                let result = store.put_file(bucket, &key, &artifact.path).await;
                (Some(key), result)
            }
            Err(e) => (None, Err(e)),
        };

        if let Err(e) = &result {
            warn!(path = %artifact.path.display(), error = %e, "File upload is not successful");
        }

        report.outcomes.push(UploadOutcome {
            path: artifact.path.clone(),
            key,
            result,
        });
    }

    info!(
        bucket,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Upload finished"
    );

    report
}
