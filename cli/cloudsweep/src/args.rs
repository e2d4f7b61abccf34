//! CLI argument definitions for cloudsweep.

use clap::{Args, Parser, Subcommand};
use cs_cli_common::LogLevel;
use cs_types::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

/// Collect AWS logs, table items, queue messages and role policies.
///
/// Collected records are written to chunked files under the output directory
/// and optionally uploaded to an S3 bucket.
///
/// ## Examples
///
/// Last 6 hours of every log group, uploaded afterwards:
///   cloudsweep logs -t 6 -b audit-bucket
///
/// Full table scan:
///   cloudsweep table -t orders
///
/// Messages waiting in a queue:
///   cloudsweep queue -q jobs
///
/// Role policies filtered by action:
///   cloudsweep policies -s ec2 -a 'Desc*' -r '*' -e Allow -p ^Amazon
#[derive(Parser, Debug)]
#[command(name = "cloudsweep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Tool configuration file (JSON with `region_name_for_logs`)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// AWS region; overrides the configuration file for logs
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// AWS profile name
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Custom AWS endpoint URL (for LocalStack)
    #[arg(long, global = true, env = "CS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Directory under which cw_logs/, scan_results/ and sqs_messages/ are created
    #[arg(long, global = true, default_value = ".")]
    pub output_dir: PathBuf,

    /// Records per output file
    #[arg(long, global = true, default_value = "1000", value_parser = parse_positive_usize)]
    pub chunk_size: usize,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save CloudWatch log events of the last hours, one file family per stream
    Logs(LogsArgs),

    /// Save every item of a DynamoDB table
    Table(TableArgs),

    /// Save the messages waiting in an SQS queue (messages are not deleted)
    Queue(QueueArgs),

    /// List the permissions of an IAM role, optionally filtered
    Policies(PoliciesArgs),
}

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Read logs from this many hours ago until now
    #[arg(short, long, default_value = "24", value_parser = parse_positive_u32)]
    pub time: u32,

    /// Only read this log group
    #[arg(short, long)]
    pub group: Option<String>,

    /// Upload the files to this bucket
    #[arg(short, long, env = "CS_BUCKET")]
    pub bucket: Option<String>,
}

#[derive(Args, Debug)]
pub struct TableArgs {
    /// Name of the table to scan
    #[arg(short, long)]
    pub table: Option<String>,

    /// Upload the files to this bucket
    #[arg(short, long, env = "CS_BUCKET")]
    pub bucket: Option<String>,
}

#[derive(Args, Debug)]
pub struct QueueArgs {
    /// Name of the queue to read
    #[arg(short, long)]
    pub queue: Option<String>,

    /// Stop after this many messages
    #[arg(long, default_value = "100", value_parser = parse_positive_usize)]
    pub max_messages: usize,

    /// Upload the files to this bucket
    #[arg(short, long, env = "CS_BUCKET")]
    pub bucket: Option<String>,
}

/// Every filter is a regular expression matched from the start of the column.
/// A statement is shown when any filter matches it; when no filter matches
/// anything, every statement is shown.
#[derive(Args, Debug)]
pub struct PoliciesArgs {
    /// Filter for the Service column
    #[arg(short, long)]
    pub service: Option<String>,

    /// Filter for the Action column
    #[arg(short, long)]
    pub action: Option<String>,

    /// Filter for the Resource column
    #[arg(short, long)]
    pub resource: Option<String>,

    /// Filter for the Effect column
    #[arg(short, long)]
    pub effect: Option<String>,

    /// Filter for the Policy name column
    #[arg(short, long = "policy-name", alias = "policyname")]
    pub policy_name: Option<String>,

    /// Role to inspect; defaults to the role of this instance's profile
    #[arg(long)]
    pub role: Option<String>,
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

/// Parse a positive u32 (>= 1).
fn parse_positive_u32(s: &str) -> Result<u32, String> {
    let value: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number of hours", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}
