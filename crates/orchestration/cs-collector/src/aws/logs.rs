//! CloudWatch Logs sources.

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::Client;
use cs_traits::{LogCatalog, PageSource, SourceResult};
use cs_types::{Page, PageCursor, Record, TimeWindow};

use super::error::classify_sdk_error;

/// Log groups, streams and events of one account and region.
#[derive(Clone)]
pub struct CloudWatchCatalog {
    client: Client,
}

impl CloudWatchCatalog {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl LogCatalog for CloudWatchCatalog {
    type Groups = LogGroups;
    type Streams = LogStreams;
    type Events = LogEvents;

    fn groups(&self) -> LogGroups {
        LogGroups {
            client: self.client.clone(),
        }
    }

    fn streams(&self, group: &str) -> LogStreams {
        LogStreams {
            client: self.client.clone(),
            group: group.to_string(),
        }
    }

    fn events(&self, group: &str, stream: &str, window: TimeWindow) -> LogEvents {
        LogEvents {
            client: self.client.clone(),
            group: group.to_string(),
            stream: stream.to_string(),
            window,
        }
    }
}

/// Every log group name.
pub struct LogGroups {
    client: Client,
}

#[async_trait]
impl PageSource for LogGroups {
    type Item = String;

    async fn fetch(&self, cursor: Option<&PageCursor>) -> SourceResult<Page<String>> {
        let output = self
            .client
            .describe_log_groups()
            .set_next_token(cursor.map(|c| c.as_str().to_string()))
            .send()
            .await
            .map_err(|e| classify_sdk_error("DescribeLogGroups", e))?;

        let items = output
            .log_groups
            .unwrap_or_default()
            .into_iter()
            .filter_map(|group| group.log_group_name)
            .collect();

        Ok(Page {
            items,
            next: output.next_token.map(PageCursor::new),
        })
    }

    fn describe(&self) -> String {
        "log groups".to_string()
    }
}

/// Every stream name of one log group.
pub struct LogStreams {
    client: Client,
    group: String,
}

#[async_trait]
impl PageSource for LogStreams {
    type Item = String;

    async fn fetch(&self, cursor: Option<&PageCursor>) -> SourceResult<Page<String>> {
        let output = self
            .client
            .describe_log_streams()
            .log_group_name(&self.group)
            .set_next_token(cursor.map(|c| c.as_str().to_string()))
            .send()
            .await
            .map_err(|e| classify_sdk_error("DescribeLogStreams", e))?;

        let items = output
            .log_streams
            .unwrap_or_default()
            .into_iter()
            .filter_map(|stream| stream.log_stream_name)
            .collect();

        Ok(Page {
            items,
            next: output.next_token.map(PageCursor::new),
        })
    }

    fn describe(&self) -> String {
        format!("log streams of {}", self.group)
    }
}

/// Events of one stream inside a fixed time window, oldest first.
pub struct LogEvents {
    client: Client,
    group: String,
    stream: String,
    window: TimeWindow,
}

impl LogEvents {
    fn grouping_key(&self) -> String {
        format!("{}/{}", self.group, self.stream)
    }
}

#[async_trait]
impl PageSource for LogEvents {
    type Item = Record;

    async fn fetch(&self, cursor: Option<&PageCursor>) -> SourceResult<Page<Record>> {
        let output = self
            .client
            .get_log_events()
            .log_group_name(&self.group)
            .log_stream_name(&self.stream)
            .start_time(self.window.start_millis())
            .end_time(self.window.end_millis())
            .start_from_head(true)
            .set_next_token(cursor.map(|c| c.as_str().to_string()))
            .send()
            .await
            .map_err(|e| classify_sdk_error("GetLogEvents", e))?;

        let key = self.grouping_key();
        let items = output
            .events
            .unwrap_or_default()
            .into_iter()
            .filter_map(|event| event.message)
            .filter(|message| !message.is_empty())
            .map(|message| Record::text(key.clone(), message))
            .collect();

        // The stream is exhausted when the service hands back the token it was given
        let next = output
            .next_forward_token
            .filter(|token| cursor.is_none_or(|c| c.as_str() != token.as_str()))
            .map(PageCursor::new);

        Ok(Page { items, next })
    }

    fn describe(&self) -> String {
        format!("log events of {}", self.grouping_key())
    }
}
