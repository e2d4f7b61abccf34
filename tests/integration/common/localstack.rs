//! LocalStack test context and utilities.

use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType,
};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sqs::Client as SqsClient;
use cs_collector::aws::AwsConfig;
use std::error::Error;
use std::time::Duration;

/// LocalStack test context providing S3, SQS and DynamoDB clients.
pub struct LocalStackTestContext {
    pub s3: S3Client,
    pub sqs: SqsClient,
    pub dynamodb: DynamoClient,
    pub endpoint: String,
    pub region: String,
}

impl LocalStackTestContext {
    /// Create a new LocalStack test context.
    ///
    /// Uses the `LOCALSTACK_ENDPOINT` environment variable if set,
    /// otherwise defaults to `http://localhost:4566`.
    pub async fn new() -> Self {
        let endpoint = std::env::var("LOCALSTACK_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4566".to_string());
        let region = "us-east-1".to_string();

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()))
            .endpoint_url(&endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        Self {
            s3: S3Client::from_conf(s3_config),
            sqs: SqsClient::new(&config),
            dynamodb: DynamoClient::new(&config),
            endpoint,
            region,
        }
    }

    /// Collector-side AWS configuration pointing at the same LocalStack.
    pub fn aws_config(&self) -> AwsConfig {
        AwsConfig::new()
            .with_region(&self.region)
            .with_endpoint(&self.endpoint)
    }

    /// Check if LocalStack is available and healthy.
    pub async fn is_available(&self) -> bool {
        self.s3.list_buckets().send().await.is_ok()
    }

    /// Create an S3 bucket for testing.
    pub async fn create_bucket(&self, name: &str) -> Result<(), aws_sdk_s3::Error> {
        let buckets = self.s3.list_buckets().send().await?;
        let exists = buckets
            .buckets()
            .iter()
            .any(|b| b.name().unwrap_or_default() == name);

        if !exists {
            self.s3.create_bucket().bucket(name).send().await?;
        }
        Ok(())
    }

    /// List objects in an S3 bucket with optional prefix.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<String>, aws_sdk_s3::Error> {
        let mut request = self.s3.list_objects_v2().bucket(bucket);
        if let Some(p) = prefix {
            request = request.prefix(p);
        }

        let result = request.send().await?;
        Ok(result
            .contents()
            .iter()
            .filter_map(|o| o.key().map(String::from))
            .collect())
    }

    /// Create an SQS queue for testing.
    ///
    /// Returns the queue URL.
    pub async fn create_queue(&self, name: &str) -> Result<String, aws_sdk_sqs::Error> {
        let result = self.sqs.create_queue().queue_name(name).send().await?;
        Ok(result.queue_url.unwrap_or_default())
    }

    /// Delete an SQS queue.
    pub async fn delete_queue(&self, queue_url: &str) -> Result<(), aws_sdk_sqs::Error> {
        self.sqs.delete_queue().queue_url(queue_url).send().await?;
        Ok(())
    }

    /// Purge all messages from an SQS queue.
    pub async fn purge_queue(&self, queue_url: &str) -> Result<(), aws_sdk_sqs::Error> {
        self.sqs.purge_queue().queue_url(queue_url).send().await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    }

    /// Send a message to an SQS queue.
    pub async fn send_message(&self, queue_url: &str, body: &str) -> Result<(), aws_sdk_sqs::Error> {
        self.sqs
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await?;
        Ok(())
    }

    /// Create a pay-per-request table keyed by the string attribute `id`.
    pub async fn create_table(&self, name: &str) -> Result<(), Box<dyn Error>> {
        self.dynamodb
            .create_table()
            .table_name(name)
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name("id")
                    .attribute_type(ScalarAttributeType::S)
                    .build()?,
            )
            .key_schema(
                KeySchemaElement::builder()
                    .attribute_name("id")
                    .key_type(KeyType::Hash)
                    .build()?,
            )
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await?;
        Ok(())
    }

    /// Delete a table.
    pub async fn delete_table(&self, name: &str) -> Result<(), aws_sdk_dynamodb::Error> {
        self.dynamodb.delete_table().table_name(name).send().await?;
        Ok(())
    }

    /// Put `count` items with ids `item-0`, `item-1`, ... and a numeric `seq`.
    pub async fn seed_table(&self, name: &str, count: usize) -> Result<(), aws_sdk_dynamodb::Error> {
        for i in 0..count {
            self.dynamodb
                .put_item()
                .table_name(name)
                .item("id", AttributeValue::S(format!("item-{i}")))
                .item("seq", AttributeValue::N(i.to_string()))
                .send()
                .await?;
        }
        Ok(())
    }
}
