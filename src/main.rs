//! # Pipeline Monitor - Main Entry Point
//!
//! One-shot probe against a media-pipeline server:
//!
//! 1. Connects to the server's control WebSocket
//! 2. Enumerates pipelines and endpoints, enabling latency instrumentation
//! 3. Samples per-endpoint transport stats (unless `--deep-stats false`)
//! 4. Prints the aggregate report line to stdout
//! 5. Optionally exports the summary as JSON

use clap::Parser;
use color_eyre::Result;
use pipeline_monitor::{
    config,
    Config,
    Monitor,
};
use pipeline_monitor_client::MediaServerClient;
use std::time::Duration;
use tracing::info;
use url::Url;

#[derive(Parser)]
#[command(name = "pipeline-monitor")]
#[command(about = "Media-pipeline telemetry probe")]
#[command(version)]
struct Cli {
    /// WebSocket address of the media server's control endpoint
    #[arg(long, env = "PIPELINE_MONITOR_SERVER_URL", default_value = config::DEFAULT_SERVER_URL)]
    server_url: Url,

    /// Collect per-endpoint stat records (loss/jitter detail). Disable to
    /// avoid flooding the server's API when endpoint counts are high.
    #[arg(long, env = "PIPELINE_MONITOR_DEEP_STATS", default_value_t = true, action = clap::ArgAction::Set)]
    deep_stats: bool,

    /// Upper bound for each individual remote query (e.g. "5s", "500ms")
    #[arg(long, default_value = "5s")]
    query_timeout: String,

    /// Output file path (optional, if provided the summary is additionally exported as JSON)
    #[arg(long)]
    output_file: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The report line owns stdout; logs go to stderr.
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("pipeline_monitor={log_level},pipeline_monitor_client={log_level}"))
        .with_writer(std::io::stderr)
        .init();

    color_eyre::install()?;

    let query_timeout = parse_timeout(&cli.query_timeout)?;
    info!("Starting pipeline monitor");
    info!("Server URL: {}", cli.server_url);
    info!("Deep stats: {}", cli.deep_stats);
    info!("Query timeout: {:?}", query_timeout);

    let config = Config {
        server_url: cli.server_url,
        deep_stats: cli.deep_stats,
        query_timeout,
        output_file: cli.output_file,
    };

    // A failed connection is the one fatal error; everything later degrades
    // per endpoint.
    let client = MediaServerClient::connect(&config.server_url).await?;

    let output_file = config.output_file.clone();
    let monitor = Monitor::new(&client, config).await?;
    let report = monitor.collect().await?;

    println!("{report}");

    if let Some(output_file) = &output_file {
        let json_string = serde_json::to_string_pretty(&report.summary())?;
        tokio::fs::write(output_file, json_string).await?;
        info!("Summary exported to {output_file}");
    }

    info!("Run completed");
    Ok(())
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    humantime::parse_duration(raw).map_err(|e| eyre::eyre!("Invalid query timeout '{raw}': {e}"))
}
