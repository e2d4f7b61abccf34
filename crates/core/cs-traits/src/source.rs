//! Record source traits.

use async_trait::async_trait;
use cs_error::SourceError;
use cs_types::{Page, PageCursor, Record, TimeWindow};
use std::time::Duration;

/// Result type for source calls.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Trait for sources that return bounded pages and a continuation cursor.
///
/// Implementations include:
/// - Log group / log stream enumeration (`nextToken`)
/// - Log events within a fixed [`TimeWindow`](cs_types::TimeWindow)
/// - Table scans (`LastEvaluatedKey`)
/// - Role policy listings (`Marker`)
///
/// # Contract
///
/// Every fetch makes progress: it returns new items, or `next: None` to signal
/// exhaustion. A continuation must differ from every cursor used so far. One
/// empty page that still carries a continuation is tolerated; a second one in
/// a row, or a repeated cursor, is a [`SourceError::ProtocolViolation`].
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Item type yielded by this source.
    type Item: Send;

    /// Fetch the page following `cursor` (`None` for the first page).
    async fn fetch(&self, cursor: Option<&PageCursor>) -> SourceResult<Page<Self::Item>>;

    /// Human-readable description for logs and error messages.
    fn describe(&self) -> String;
}

/// Trait for streaming sources with no natural end.
///
/// Receiving is at-least-once: a record returned here but never deleted
/// becomes visible again after the source's visibility timeout and may be
/// delivered to a later run.
#[async_trait]
pub trait ReceiveSource: Send + Sync {
    /// Receive up to `max` records, waiting at most `wait` for the first one.
    ///
    /// An empty vector means nothing arrived within the wait.
    async fn receive(&self, max: usize, wait: Duration) -> SourceResult<Vec<Record>>;

    /// Human-readable description for logs and error messages.
    fn describe(&self) -> String;
}

/// Factory for the paginated sources behind a logs run.
pub trait LogCatalog: Send + Sync {
    /// Source of log group names.
    type Groups: PageSource<Item = String>;

    /// Source of log stream names within one group.
    type Streams: PageSource<Item = String>;

    /// Source of log events within one stream.
    type Events: PageSource<Item = Record>;

    /// Enumerate every log group.
    fn groups(&self) -> Self::Groups;

    /// Enumerate the streams of `group`.
    fn streams(&self, group: &str) -> Self::Streams;

    /// Events of `group`/`stream` inside `window`.
    fn events(&self, group: &str, stream: &str, window: TimeWindow) -> Self::Events;
}

/// Factory for table scans.
pub trait TableCatalog: Send + Sync {
    /// Source of table items.
    type Scan: PageSource<Item = Record>;

    /// Full scan of `table`. A missing table surfaces on the first fetch.
    fn scan(&self, table: &str) -> Self::Scan;
}

/// Factory for queue receivers.
#[async_trait]
pub trait QueueCatalog: Send + Sync {
    /// Receiver bound to one queue.
    type Queue: ReceiveSource;

    /// Resolve `name` to a receiver, failing with
    /// [`SourceError::NotFound`] when the queue does not exist.
    async fn open(&self, name: &str) -> SourceResult<Self::Queue>;
}
