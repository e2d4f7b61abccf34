//! SQS queue collection tests using LocalStack.

use crate::common::LocalStackTestContext;
use cs_collector::aws::{SqsCatalog, load_sdk_config};
use cs_collector::{CollectorConfig, Orchestrator, Phase, QueueScanConfig};
use cs_error::SourceError;
use std::time::Duration;

async fn catalog(ctx: &LocalStackTestContext) -> SqsCatalog {
    let sdk_config = load_sdk_config(&ctx.aws_config()).await;
    SqsCatalog::new(aws_sdk_sqs::Client::new(&sdk_config))
}

fn config(dir: &std::path::Path, max_records: usize) -> CollectorConfig {
    CollectorConfig::new().with_base_dir(dir).with_queue(
        QueueScanConfig::new()
            .with_max_records(max_records)
            .with_wait_time(Duration::from_secs(1)),
    )
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_queue_drain_stops_at_cap() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let queue_url = ctx.create_queue("cs-drain-queue").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();

    for i in 0..7 {
        ctx.send_message(&queue_url, &format!("job {i}")).await.unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(config(dir.path(), 5));
    let mut report = orchestrator
        .run_queue(&catalog(&ctx).await, Some("cs-drain-queue"))
        .await
        .unwrap();
    orchestrator.finish(&mut report).await;

    assert_eq!(report.phase, Phase::Done);
    assert_eq!(report.stats.records_fetched, 5);
    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(report.artifacts[0].file_name(), Some("cs-drain-queue-1-5.txt"));

    let content = std::fs::read_to_string(&report.artifacts[0].path).unwrap();
    assert_eq!(content.lines().count(), 5);
    assert!(content.lines().all(|line| line.starts_with("job ")));

    ctx.delete_queue(&queue_url).await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_empty_queue_writes_nothing() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let queue_url = ctx.create_queue("cs-empty-queue").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();

    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(config(dir.path(), 100));
    let report = orchestrator
        .run_queue(&catalog(&ctx).await, Some("cs-empty-queue"))
        .await
        .unwrap();

    assert_eq!(report.stats.records_fetched, 0);
    assert!(report.artifacts.is_empty());

    ctx.delete_queue(&queue_url).await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_missing_queue_is_not_found() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(config(dir.path(), 10));
    let report = orchestrator
        .run_queue(&catalog(&ctx).await, Some("cs-queue-that-does-not-exist"))
        .await
        .unwrap();

    assert!(matches!(report.failure, Some(SourceError::NotFound(_))));
    assert!(report.artifacts.is_empty());
}
