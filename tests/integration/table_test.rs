//! DynamoDB table collection and S3 upload tests using LocalStack.

use crate::common::LocalStackTestContext;
use cs_collector::aws::{DynamoCatalog, S3Store, load_sdk_config, s3_client};
use cs_collector::{ChunkConfig, CollectorConfig, Orchestrator, Uploader};
use cs_error::SourceError;

async fn catalog(ctx: &LocalStackTestContext) -> DynamoCatalog {
    let sdk_config = load_sdk_config(&ctx.aws_config()).await;
    DynamoCatalog::new(aws_sdk_dynamodb::Client::new(&sdk_config))
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_table_scan_is_chunked() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    ctx.delete_table("cs-chunked").await.ok();
    ctx.create_table("cs-chunked").await.unwrap();
    ctx.seed_table("cs-chunked", 5).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let config = CollectorConfig::new()
        .with_base_dir(dir.path())
        .with_chunk(ChunkConfig::new().with_chunk_size(2));
    let orchestrator = Orchestrator::new(config);

    let report = orchestrator
        .run_table(&catalog(&ctx).await, Some("cs-chunked"))
        .await
        .unwrap();

    let names: Vec<&str> = report.artifacts.iter().filter_map(|a| a.file_name()).collect();
    assert_eq!(
        names,
        vec!["cs-chunked-1-2.txt", "cs-chunked-3-4.txt", "cs-chunked-5-5.txt"]
    );

    let mut ids = Vec::new();
    for artifact in &report.artifacts {
        let content = std::fs::read_to_string(&artifact.path).unwrap();
        for line in content.lines() {
            let item: serde_json::Value = serde_json::from_str(line).unwrap();
            ids.push(item["id"]["S"].as_str().unwrap().to_string());
        }
    }
    ids.sort();
    assert_eq!(ids, (0..5).map(|i| format!("item-{i}")).collect::<Vec<_>>());

    ctx.delete_table("cs-chunked").await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_table_artifacts_are_uploaded() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    ctx.create_bucket("cs-upload-bucket").await.unwrap();
    ctx.delete_table("cs-uploaded").await.ok();
    ctx.create_table("cs-uploaded").await.unwrap();
    ctx.seed_table("cs-uploaded", 3).await.unwrap();

    let aws = ctx.aws_config();
    let sdk_config = load_sdk_config(&aws).await;
    let store = S3Store::new(s3_client(&sdk_config, &aws));

    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(CollectorConfig::new().with_base_dir(dir.path()))
        .with_uploader(Uploader::new(store, "cs-upload-bucket"));

    let mut report = orchestrator
        .run_table(&catalog(&ctx).await, Some("cs-uploaded"))
        .await
        .unwrap();
    orchestrator.finish(&mut report).await;

    let uploads = report.uploads.as_ref().unwrap();
    assert_eq!(uploads.succeeded(), 1);
    assert_eq!(uploads.failed(), 0);

    let keys = ctx
        .list_objects("cs-upload-bucket", Some("scan_results/"))
        .await
        .unwrap();
    assert!(keys.contains(&"scan_results/cs-uploaded-1-3.txt".to_string()));

    ctx.delete_table("cs-uploaded").await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_missing_table_is_not_found() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(CollectorConfig::new().with_base_dir(dir.path()));
    let report = orchestrator
        .run_table(&catalog(&ctx).await, Some("cs-table-that-does-not-exist"))
        .await
        .unwrap();

    assert!(matches!(report.failure, Some(SourceError::NotFound(_))));
    assert!(report.artifacts.is_empty());
}
