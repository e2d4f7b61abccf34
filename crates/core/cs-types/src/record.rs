//! Records, pages and retrieval windows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default lookback for time-windowed sources, in hours.
pub const DEFAULT_LOOKBACK_HOURS: u32 = 24;

/// Payload of a retrieved record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Plain text (log message, queue message body)
    Text(String),

    /// Structured document (table item)
    Structured(serde_json::Value),
}

/// An opaque unit of retrieved data. Immutable once retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Raw payload
    pub payload: Payload,

    /// Logical grouping key (source stream, table or queue name)
    pub grouping_key: String,

    /// When the record was retrieved
    pub retrieved_at: DateTime<Utc>,
}

impl Record {
    /// Create a text record retrieved now.
    pub fn text(grouping_key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            payload: Payload::Text(text.into()),
            grouping_key: grouping_key.into(),
            retrieved_at: Utc::now(),
        }
    }

    /// Create a structured record retrieved now.
    pub fn structured(grouping_key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            payload: Payload::Structured(value),
            grouping_key: grouping_key.into(),
            retrieved_at: Utc::now(),
        }
    }

    /// Render the record as a single artifact line (without the trailing newline).
    ///
    /// Text is written as-is; structured payloads are written as compact JSON.
    pub fn to_line(&self) -> serde_json::Result<String> {
        match &self.payload {
            Payload::Text(text) => Ok(text.clone()),
            Payload::Structured(value) => serde_json::to_string(value),
        }
    }
}

/// Opaque continuation token. Single use, strictly forward.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Tokens can be long opaque blobs
        if self.0.chars().count() > 16 {
            let head: String = self.0.chars().take(16).collect();
            write!(f, "{head}...")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Result of one bounded fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in source order
    pub items: Vec<T>,

    /// Continuation; `None` signals exhaustion
    pub next: Option<PageCursor>,
}

impl<T> Page<T> {
    /// A page followed by more pages.
    pub fn more(items: Vec<T>, next: PageCursor) -> Self {
        Self {
            items,
            next: Some(next),
        }
    }

    /// The final page.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    /// Whether the source reported exhaustion.
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// Fixed start/stop window for time-bounded sources.
///
/// Computed once per run; every fetch uses the same window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive start
    pub start: DateTime<Utc>,

    /// Exclusive end
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window covering the last `hours` hours up to now.
    pub fn lookback(hours: u32) -> Self {
        Self::ending_at(Utc::now(), hours)
    }

    /// Window covering `hours` hours before `end`.
    pub fn ending_at(end: DateTime<Utc>, hours: u32) -> Self {
        Self {
            start: end - Duration::hours(i64::from(hours)),
            end,
        }
    }

    /// Start as epoch milliseconds.
    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// End as epoch milliseconds.
    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::lookback(DEFAULT_LOOKBACK_HOURS)
    }
}
