//! Turning paginated and streaming sources into one lazy record sequence.

use async_stream::try_stream;
use cs_error::SourceError;
use cs_traits::{PageSource, ReceiveSource};
use cs_types::{PageCursor, Record};
use futures::Stream;
use std::collections::HashSet;
use tracing::debug;

use crate::config::QueueScanConfig;

/// Consecutive empty pages with a continuation that count as a stalled source.
const MAX_EMPTY_PAGES: usize = 2;

/// Drive `source` from `seed` until it reports exhaustion.
///
/// Returns a stream of items in source order, fetching the next page only when
/// the previous one has been consumed. Every fetch must make progress, so two
/// things end the stream with [`SourceError::ProtocolViolation`]:
///
/// - a cursor the source has already handed out (including the seed)
/// - a second consecutive page with no items that still carries a
///   continuation instead of signalling exhaustion
///
/// For time-windowed sources the window lives inside the source; every fetch
/// reuses it and only the cursor advances.
///
/// # Example
///
/// ```ignore
/// use futures::{StreamExt, pin_mut};
///
/// let stream = paginate(&scan, None);
/// pin_mut!(stream);
///
/// while let Some(item) = stream.next().await {
///     let record = item?;
///     println!("{}", record.to_line()?);
/// }
/// ```
pub fn paginate<'a, S>(
    source: &'a S,
    seed: Option<PageCursor>,
) -> impl Stream<Item = Result<S::Item, SourceError>> + 'a
where
    S: PageSource,
{
    try_stream! {
        let mut seen: HashSet<PageCursor> = HashSet::new();
        if let Some(ref cursor) = seed {
            seen.insert(cursor.clone());
        }

        let mut cursor = seed;
        let mut pages = 0usize;
        let mut empty_streak = 0usize;

        loop {
            let page = source.fetch(cursor.as_ref()).await?;
            pages += 1;

            let empty = page.items.is_empty();
            debug!(
                source = %source.describe(),
                page = pages,
                items = page.items.len(),
                last = page.is_last(),
                "Fetched page"
            );

            for item in page.items {
                yield item;
            }

            let Some(next) = page.next else {
                break;
            };

            if !seen.insert(next.clone()) {
                let detail = if empty { " after an empty page" } else { "" };
                Err::<(), _>(SourceError::ProtocolViolation(format!(
                    "{} repeated cursor '{}'{} on page {}",
                    source.describe(),
                    next,
                    detail,
                    pages
                )))?;
            }

            empty_streak = if empty { empty_streak + 1 } else { 0 };
            if empty_streak >= MAX_EMPTY_PAGES {
                Err::<(), _>(SourceError::ProtocolViolation(format!(
                    "{} returned {} empty pages in a row without signalling exhaustion (page {})",
                    source.describe(),
                    empty_streak,
                    pages
                )))?;
            }

            cursor = Some(next);
        }
    }
}

/// Receive from a streaming source until it runs dry or the cap is reached.
///
/// Terminates on the first empty receive or once `config.max_records` records
/// have been received, whichever comes first. Each receive asks for at most the
/// remaining budget, so the cap is never exceeded, and waits up to
/// `config.wait_time` so an idle source is not busy-polled.
///
/// Receiving does not delete anything: records read here will be redelivered
/// after their visibility timeout. This is at-least-once delivery.
pub fn drain<'a, R>(
    source: &'a R,
    config: &'a QueueScanConfig,
) -> impl Stream<Item = Result<Record, SourceError>> + 'a
where
    R: ReceiveSource,
{
    try_stream! {
        let mut received = 0usize;

        while received < config.max_records {
            let budget = (config.max_records - received).min(config.batch_size);
            let batch = source.receive(budget, config.wait_time).await?;

            debug!(
                source = %source.describe(),
                received = batch.len(),
                total = received + batch.len(),
                "Received batch"
            );

            if batch.is_empty() {
                break;
            }

            // A source returning more than asked for still must not break the cap
            for record in batch.into_iter().take(budget) {
                received += 1;
                yield record;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cs_traits::SourceResult;
    use cs_types::Page;
    use futures::{StreamExt, TryStreamExt};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Source that serves a fixed list of pages keyed by cursor.
    struct ScriptedPages {
        pages: Vec<(Option<&'static str>, Vec<&'static str>, Option<&'static str>)>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl PageSource for ScriptedPages {
        type Item = String;

        async fn fetch(&self, cursor: Option<&PageCursor>) -> SourceResult<Page<String>> {
            *self.calls.lock().unwrap() += 1;
            let key = cursor.map(|c| c.as_str());
            let (_, items, next) = self
                .pages
                .iter()
                .find(|(at, _, _)| *at == key)
                .ok_or_else(|| SourceError::MalformedResponse(format!("no page at {key:?}")))?;

            let items = items.iter().map(|s| s.to_string()).collect();
            Ok(Page {
                items,
                next: next.map(PageCursor::new),
            })
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    #[tokio::test]
    async fn test_pages_flatten_in_order() {
        let source = ScriptedPages {
            pages: vec![
                (None, vec!["A", "B"], Some("c1")),
                (Some("c1"), vec!["C"], Some("c2")),
                (Some("c2"), vec![], None),
            ],
            calls: Mutex::new(0),
        };

        let items: Vec<String> = paginate(&source, None).try_collect().await.unwrap();

        assert_eq!(items, vec!["A", "B", "C"]);
        assert_eq!(*source.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_seed_cursor_starts_midway() {
        let source = ScriptedPages {
            pages: vec![
                (None, vec!["A"], Some("c1")),
                (Some("c1"), vec!["B"], None),
            ],
            calls: Mutex::new(0),
        };

        let items: Vec<String> = paginate(&source, Some(PageCursor::new("c1")))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(items, vec!["B"]);
    }

    #[tokio::test]
    async fn test_repeated_empty_page_is_violation() {
        let source = ScriptedPages {
            pages: vec![
                (None, vec!["A"], Some("c1")),
                (Some("c1"), vec![], Some("c1")),
            ],
            calls: Mutex::new(0),
        };

        let results: Vec<_> = paginate(&source, None).collect().await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Ok("A".to_string()));
        assert!(matches!(results[1], Err(SourceError::ProtocolViolation(_))));
        assert_eq!(*source.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_single_empty_page_with_continuation_is_tolerated() {
        let source = ScriptedPages {
            pages: vec![
                (None, vec!["A"], Some("c1")),
                (Some("c1"), vec![], Some("c2")),
                (Some("c2"), vec!["B"], None),
            ],
            calls: Mutex::new(0),
        };

        let items: Vec<String> = paginate(&source, None).try_collect().await.unwrap();

        assert_eq!(items, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_endless_empty_pages_are_violation() {
        /// Always answers with no items and a fresh token.
        struct Stalled {
            calls: Mutex<usize>,
        }

        #[async_trait]
        impl PageSource for Stalled {
            type Item = String;

            async fn fetch(&self, _cursor: Option<&PageCursor>) -> SourceResult<Page<String>> {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                Ok(Page::more(vec![], PageCursor::new(format!("t{calls}"))))
            }

            fn describe(&self) -> String {
                "stalled".to_string()
            }
        }

        let source = Stalled {
            calls: Mutex::new(0),
        };

        let results: Vec<_> = paginate(&source, None).collect().await;

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(SourceError::ProtocolViolation(_))));
        assert_eq!(*source.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cursor_cycle_is_violation() {
        let source = ScriptedPages {
            pages: vec![
                (None, vec!["A"], Some("c1")),
                (Some("c1"), vec!["B"], Some("c2")),
                (Some("c2"), vec!["C"], Some("c1")),
            ],
            calls: Mutex::new(0),
        };

        let result: Result<Vec<String>, _> = paginate(&source, None).try_collect().await;

        assert!(matches!(result, Err(SourceError::ProtocolViolation(_))));
    }

    #[tokio::test]
    async fn test_fetch_error_ends_stream() {
        struct Missing;

        #[async_trait]
        impl PageSource for Missing {
            type Item = String;

            async fn fetch(&self, _cursor: Option<&PageCursor>) -> SourceResult<Page<String>> {
                Err(SourceError::NotFound("table ghosts".to_string()))
            }

            fn describe(&self) -> String {
                "missing".to_string()
            }
        }

        let results: Vec<_> = paginate(&Missing, None).collect().await;

        assert_eq!(
            results,
            vec![Err(SourceError::NotFound("table ghosts".to_string()))]
        );
    }

    /// Receiver that hands out `total` numbered records in batches.
    struct CountingQueue {
        total: usize,
        handed_out: Mutex<usize>,
        requests: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl ReceiveSource for CountingQueue {
        async fn receive(&self, max: usize, _wait: Duration) -> SourceResult<Vec<Record>> {
            self.requests.lock().unwrap().push(max);
            let mut handed_out = self.handed_out.lock().unwrap();
            let n = max.min(self.total - *handed_out);
            let batch = (*handed_out..*handed_out + n)
                .map(|i| Record::text("jobs", format!("message {i}")))
                .collect();
            *handed_out += n;
            Ok(batch)
        }

        fn describe(&self) -> String {
            "queue jobs".to_string()
        }
    }

    #[tokio::test]
    async fn test_drain_stops_on_empty_receive() {
        let queue = CountingQueue {
            total: 25,
            handed_out: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
        };
        let config = QueueScanConfig::new();

        let records: Vec<Record> = drain(&queue, &config).try_collect().await.unwrap();

        assert_eq!(records.len(), 25);
        // 10 + 10 + 5, then one empty receive
        assert_eq!(queue.requests.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_drain_stops_at_cap() {
        let queue = CountingQueue {
            total: 1000,
            handed_out: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
        };
        let config = QueueScanConfig::new().with_max_records(25);

        let records: Vec<Record> = drain(&queue, &config).try_collect().await.unwrap();

        assert_eq!(records.len(), 25);
        assert_eq!(*queue.requests.lock().unwrap(), vec![10, 10, 5]);
    }
}
