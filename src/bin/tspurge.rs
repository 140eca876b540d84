//! tspurge binary
//!
//! Deletes a time window of data points for one or more metrics.
//!
//! Usage:
//!   tspurge --start 1497387618 --end 1497391218 --host hbasehost.local sys.cpu.user
//!
//! Exit codes: 0 success, 1 operational failure, 2 usage error,
//! 3 unknown metric, 4 declined at the prompt.

use tspurge::config::{ComponentFactory, SchemaConfig, StoreConfig};
use tspurge::confirm::{AssumeYes, Confirm, ConfirmationGate};
use tspurge::purge::{LogReporter, PurgeMode};
use tspurge::session::{PurgeRequest, PurgeSession};
use tspurge::telemetry::Telemetry;
use tspurge::Error;

use clap::Parser;
use std::time::Duration;
use tracing::{error, info};

/// Purge data points for metrics within a time window
#[derive(Parser, Debug)]
#[command(name = "tspurge", author, version, about, long_about = None)]
struct Args {
    /// Start time in unix epoch seconds. Rounded down to the hour.
    #[arg(short, long, allow_negative_numbers = true)]
    start: i64,

    /// End time in unix epoch seconds. Rounded up to the hour.
    #[arg(short, long, allow_negative_numbers = true)]
    end: i64,

    /// HBase REST gateway host, full URL, or "memory"
    #[arg(long, env = "TSPURGE_HOST")]
    host: String,

    /// HBase REST gateway port
    #[arg(long, env = "TSPURGE_PORT", default_value = "8080")]
    port: u16,

    /// Use https for the gateway
    #[arg(long, env = "TSPURGE_TLS", default_value = "false")]
    tls: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Iterate through all matching rows but don't delete them
    #[arg(short, long, visible_alias = "dry-run")]
    noop: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Log level
    #[arg(long, env = "TSPURGE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "TSPURGE_LOG_FORMAT", default_value = "text")]
    log_format: String,

    /// Log progress at info every N rows
    #[arg(long, default_value = "1000")]
    progress_every: u64,

    /// Metric names to purge
    #[arg(value_name = "METRIC_NAME", required = true, num_args = 1..)]
    metrics: Vec<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        if let Some(Error::UserAborted) = e.downcast_ref::<Error>() {
            eprintln!("Aborted, nothing was deleted.");
            std::process::exit(Error::UserAborted.exit_code());
        }

        let code = e
            .downcast_ref::<Error>()
            .map(Error::exit_code)
            .unwrap_or(1);
        error!(error = %e, exit_code = code, "tspurge failed");
        eprintln!("Error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(code);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let _telemetry = Telemetry::init_for_component("tspurge", &args.log_level, &args.log_format)?;

    let mode = PurgeMode::from_noop(args.noop);
    let request = PurgeRequest::new(args.metrics, args.start, args.end, mode)?;
    let schema = SchemaConfig::from_env()?;

    let store_config = StoreConfig {
        host: args.host,
        port: args.port,
        tls: args.tls,
        request_timeout: Duration::from_secs(args.timeout_secs),
        ..Default::default()
    };
    let store = ComponentFactory::create_store(&store_config)?;

    info!(
        metrics = ?request.metrics,
        start = request.window.start,
        end = request.window.end,
        mode = mode.as_str(),
        data_table = %schema.data_table,
        "Starting tspurge"
    );

    let session = PurgeSession::new(store, schema);
    let reporter = LogReporter::new(args.progress_every);
    let mut gate: Box<dyn Confirm> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(ConfirmationGate::new(std::io::stdin().lock(), std::io::stderr()))
    };

    let report = session.run(&request, gate.as_mut(), &reporter).await?;
    for outcome in &report.outcomes {
        println!("{outcome}");
    }

    report.into_result()?;
    Ok(())
}
