//! Main execution logic for the cloudsweep CLI.

use anyhow::Result;
use cs_cli_common::{format_number, render_numbered, render_table};
use cs_collector::aws::{
    AwsConfig, CloudWatchCatalog, DynamoCatalog, S3Store, SqsCatalog, load_sdk_config, s3_client,
};
use cs_collector::{
    ChunkConfig, CollectorConfig, Orchestrator, Phase, QueueScanConfig, RunReport, Uploader,
    resolve_config,
};
use cs_error::{CsError, ErrorCategory, classify_error};
use cs_policy::{IamPolicySource, PredicateSet, RuleFilter, instance_role, run_policies};
use cs_types::{Field, RegionSetting};
use tracing::info;

use crate::args::{Cli, Command, GlobalArgs, LogsArgs, PoliciesArgs, QueueArgs, TableArgs};

/// Exit status for a failed run.
///
/// Missing targets, missing resources and fetch failures end only the
/// resource's run and exit with 2; everything else is a startup failure and
/// exits with 1.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<CsError>().map(classify_error) {
        Some(ErrorCategory::FatalPerResource) => 2,
        _ => 1,
    }
}

/// Execute the selected subcommand.
pub async fn execute(args: Cli) -> Result<()> {
    let region = resolve_config(&args.global.config).map_err(CsError::from)?;
    let global = args.global;

    match args.command {
        Command::Logs(cmd) => logs(&global, &region, cmd).await,
        Command::Table(cmd) => table(&global, cmd).await,
        Command::Queue(cmd) => queue(&global, cmd).await,
        Command::Policies(cmd) => policies(&global, cmd).await,
    }
}

fn aws_config(global: &GlobalArgs) -> AwsConfig {
    let mut config = AwsConfig::new();
    if let Some(region) = &global.region {
        config = config.with_region(region);
    }
    if let Some(endpoint) = &global.endpoint_url {
        config = config.with_endpoint(endpoint);
    }
    if let Some(profile) = &global.profile {
        config = config.with_profile(profile);
    }
    config
}

fn collector_config(global: &GlobalArgs) -> CollectorConfig {
    CollectorConfig::new()
        .with_base_dir(&global.output_dir)
        .with_chunk(ChunkConfig::new().with_chunk_size(global.chunk_size))
}

/// Build the orchestrator, with an uploader only when a bucket was given.
async fn orchestrator(global: &GlobalArgs, config: CollectorConfig, bucket: Option<String>) -> Orchestrator {
    let orchestrator = Orchestrator::new(config);

    match bucket {
        Some(bucket) => {
            let aws = aws_config(global);
            let sdk_config = load_sdk_config(&aws).await;
            let store = S3Store::new(s3_client(&sdk_config, &aws));
            orchestrator.with_uploader(Uploader::new(store, bucket))
        }
        None => orchestrator,
    }
}

async fn logs(global: &GlobalArgs, region: &RegionSetting, cmd: LogsArgs) -> Result<()> {
    info!(region = %region, "Log region");
    let aws = aws_config(global).with_region_setting(region);
    let sdk_config = load_sdk_config(&aws).await;
    let catalog = CloudWatchCatalog::new(aws_sdk_cloudwatchlogs::Client::new(&sdk_config));

    let config = collector_config(global).with_lookback_hours(cmd.time);
    let orchestrator = orchestrator(global, config, cmd.bucket).await;

    let mut report = orchestrator.run_logs(&catalog, cmd.group.as_deref()).await?;

    report.enter(Phase::Present);
    println!("\nAvailable Cloudwatch logs: \n");
    print!("{}", render_numbered("Groups", &report.groups));

    finish(&orchestrator, report).await
}

async fn table(global: &GlobalArgs, cmd: TableArgs) -> Result<()> {
    let sdk_config = load_sdk_config(&aws_config(global)).await;
    let catalog = DynamoCatalog::new(aws_sdk_dynamodb::Client::new(&sdk_config));

    let orchestrator = orchestrator(global, collector_config(global), cmd.bucket).await;
    let report = orchestrator.run_table(&catalog, cmd.table.as_deref()).await?;

    finish(&orchestrator, report).await
}

async fn queue(global: &GlobalArgs, cmd: QueueArgs) -> Result<()> {
    let queue_config = QueueScanConfig::new().with_max_records(cmd.max_messages);

    let sdk_config = load_sdk_config(&aws_config(global)).await;
    let catalog = SqsCatalog::new(aws_sdk_sqs::Client::new(&sdk_config))
        .with_visibility_timeout(queue_config.visibility_timeout_secs);

    let config = collector_config(global).with_queue(queue_config);
    let orchestrator = orchestrator(global, config, cmd.bucket).await;
    let report = orchestrator.run_queue(&catalog, cmd.queue.as_deref()).await?;

    finish(&orchestrator, report).await
}

async fn policies(global: &GlobalArgs, cmd: PoliciesArgs) -> Result<()> {
    let predicates = PredicateSet {
        service: cmd.service,
        action: cmd.action,
        resource: cmd.resource,
        effect: cmd.effect,
        policy_name: cmd.policy_name,
    };
    // Bad patterns stop the run before any request is made
    RuleFilter::new(&predicates).map_err(CsError::from)?;

    let role = match cmd.role {
        Some(role) => role,
        None => instance_role().await.map_err(CsError::from)?,
    };

    let sdk_config = load_sdk_config(&aws_config(global)).await;
    let source = IamPolicySource::new(aws_sdk_iam::Client::new(&sdk_config));
    let report = run_policies(&source, &role, &predicates).await?;

    let headings = [
        Field::Service,
        Field::Action,
        Field::Resource,
        Field::Effect,
        Field::PolicyName,
    ]
    .map(|field| field.heading());
    let rows: Vec<Vec<&str>> = report.rows().map(|s| s.row().to_vec()).collect();

    println!("\nThe following permissions belong to the role {}: \n", report.role);
    print!("{}", render_table(&headings, &rows));

    for skipped in &report.skipped {
        eprintln!("  Skipped: {}", skipped);
    }
    Ok(())
}

/// Upload if configured, then report the run to stderr.
///
/// A run that a source failure ended early is still uploaded and reported;
/// the failure is returned afterwards.
async fn finish(orchestrator: &Orchestrator, mut report: RunReport) -> Result<()> {
    orchestrator.finish(&mut report).await;
    print_summary(&report);

    match report.failure {
        Some(error) => Err(CsError::from(error).into()),
        None => Ok(()),
    }
}

fn print_summary(report: &RunReport) {
    let stats = &report.stats;

    eprintln!();
    eprintln!("Collection of {} completed:", report.kind);
    eprintln!("  Records fetched:   {}", format_number(stats.records_fetched as u64));
    eprintln!("  Files written:     {}", format_number(stats.artifacts_written as u64));
    eprintln!("  Chunks skipped:    {}", stats.chunks_skipped);

    if let Some(uploads) = &report.uploads {
        eprintln!(
            "  Uploaded to {}: {} ok, {} failed",
            uploads.bucket,
            uploads.succeeded(),
            uploads.failed()
        );
    }

    if let Some(duration) = stats.duration() {
        eprintln!(
            "  Duration:          {:.2}s",
            duration.num_milliseconds() as f64 / 1000.0
        );

        if let Some(rps) = stats.records_per_second() {
            eprintln!("  Throughput:        {:.1} records/sec", rps);
        }
    }

    if stats.has_errors() {
        eprintln!("  Errors:");
        for error in &stats.errors {
            eprintln!("    {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_error::{ConfigError, SourceError};

    #[test]
    fn test_malformed_config_exits_with_one() {
        let error = anyhow::Error::from(CsError::from(ConfigError::Malformed {
            path: "conf.json".to_string(),
            reason: "expected value at line 1 column 1".to_string(),
        }));

        assert_eq!(exit_code(&error), 1);
    }

    #[test]
    fn test_resource_failures_exit_with_two() {
        let missing = anyhow::Error::from(CsError::MissingTarget("Please specify a table name.".to_string()));
        let not_found = anyhow::Error::from(CsError::from(SourceError::NotFound("table ghosts".to_string())));
        let stalled = anyhow::Error::from(CsError::from(SourceError::ProtocolViolation(
            "table orders repeated cursor".to_string(),
        )));

        assert_eq!(exit_code(&missing), 2);
        assert_eq!(exit_code(&not_found), 2);
        assert_eq!(exit_code(&stalled), 2);
    }

    #[test]
    fn test_errors_outside_the_taxonomy_exit_with_one() {
        let error = anyhow::anyhow!("Failed to initialize logging");

        assert_eq!(exit_code(&error), 1);
    }
}
