//! SQS receive source.
//!
//! Messages are received but never deleted. Each one becomes visible again
//! once its visibility timeout runs out, so repeated runs may see the same
//! message more than once.

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use cs_traits::{QueueCatalog, ReceiveSource, SourceResult};
use cs_types::Record;
use std::time::Duration;
use tracing::{debug, info};

use super::error::classify_sdk_error;
use crate::config::{DEFAULT_VISIBILITY_TIMEOUT_SECS, MAX_QUEUE_WAIT_SECS};

/// SQS allows at most 10 messages per receive.
const MAX_RECEIVE_BATCH: usize = 10;

/// Queues of one account and region.
#[derive(Clone)]
pub struct SqsCatalog {
    client: Client,
    visibility_timeout_secs: i32,
}

impl SqsCatalog {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            visibility_timeout_secs: DEFAULT_VISIBILITY_TIMEOUT_SECS,
        }
    }

    /// Set how long received messages stay hidden from other consumers.
    pub fn with_visibility_timeout(mut self, seconds: i32) -> Self {
        self.visibility_timeout_secs = seconds.max(0);
        self
    }
}

#[async_trait]
impl QueueCatalog for SqsCatalog {
    type Queue = SqsQueue;

    /// Resolve the queue URL. A queue that does not exist is `NotFound`; it is
    /// never created.
    async fn open(&self, name: &str) -> SourceResult<SqsQueue> {
        let output = self
            .client
            .get_queue_url()
            .queue_name(name)
            .send()
            .await
            .map_err(|e| classify_sdk_error("GetQueueUrl", e))?;

        let url = output.queue_url.ok_or_else(|| {
            cs_error::SourceError::MalformedResponse(format!("GetQueueUrl returned no URL for {name}"))
        })?;
        debug!(queue = name, url = %url, "Resolved queue");

        Ok(SqsQueue {
            client: self.client.clone(),
            name: name.to_string(),
            url,
            visibility_timeout_secs: self.visibility_timeout_secs,
        })
    }
}

/// One resolved queue.
pub struct SqsQueue {
    client: Client,
    name: String,
    url: String,
    visibility_timeout_secs: i32,
}

#[async_trait]
impl ReceiveSource for SqsQueue {
    async fn receive(&self, max: usize, wait: Duration) -> SourceResult<Vec<Record>> {
        let batch_size = max.clamp(1, MAX_RECEIVE_BATCH) as i32;
        let wait_secs = wait.as_secs().min(MAX_QUEUE_WAIT_SECS) as i32;

        let output = self
            .client
            .receive_message()
            .queue_url(&self.url)
            .max_number_of_messages(batch_size)
            .wait_time_seconds(wait_secs)
            .visibility_timeout(self.visibility_timeout_secs)
            .send()
            .await
            .map_err(|e| classify_sdk_error("ReceiveMessage", e))?;

        let records = output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|message| {
                let body = message.body.unwrap_or_default();
                info!(
                    queue = %self.name,
                    message_id = message.message_id.as_deref().unwrap_or("-"),
                    body = %body,
                    "Received message"
                );
                Record::text(self.name.clone(), body)
            })
            .collect();

        Ok(records)
    }

    fn describe(&self) -> String {
        format!("queue {}", self.name)
    }
}
