//! Traits at the seams between cloudsweep and the outside world.
//!
//! - [`PageSource`] - Cursor-based or time-windowed paginated retrieval
//! - [`ReceiveSource`] - Streaming sources with no natural end (queues)
//! - [`ObjectStore`] - Upload destination for finished artifacts
//! - [`PolicySource`] - Policy documents attached to a role
//!
//! Production implementations wrap the AWS SDK clients; tests use in-memory fakes.

pub mod policy;
pub mod source;
pub mod store;

pub use policy::{PolicyDocument, PolicySource};
pub use source::{
    LogCatalog, PageSource, QueueCatalog, ReceiveSource, SourceResult, TableCatalog,
};
pub use store::ObjectStore;
