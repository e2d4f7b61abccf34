//! AWS SDK adapters for the source and store traits.
//!
//! - [`CloudWatchCatalog`] - log groups, streams and windowed events
//! - [`DynamoCatalog`] - full table scans
//! - [`SqsCatalog`] - queue receive without delete
//! - [`S3Store`] - artifact upload
//!
//! Every SDK failure is mapped to a [`cs_error::SourceError`] by
//! [`classify_sdk_error`] at the call site.

mod client;
mod dynamodb;
mod error;
mod logs;
mod s3;
mod sqs;

pub use client::{AwsConfig, load_sdk_config, s3_client};
pub use dynamodb::{DynamoCatalog, TableScan, attribute_from_json, attribute_to_json};
pub use error::{classify_sdk_error, is_not_found_code};
pub use logs::{CloudWatchCatalog, LogEvents, LogGroups, LogStreams};
pub use s3::S3Store;
pub use sqs::{SqsCatalog, SqsQueue};
