//! Scheduled trigger for the preprocess + push sequence
//!
//! Calls POST /preprocess then POST /push_summary in strict order over
//! HTTP, treating the pipeline as a remote collaborator. A failed step
//! aborts the sequence; the whole sequence is retried a bounded number of
//! times with a fixed delay before the run is reported as failed.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "prepflow-scheduler")]
#[command(about = "Runs preprocess then summary push against the prepflow API on a schedule")]
struct Args {
    /// Path to scheduler config JSON
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Retries for the whole sequence after a failed attempt
    #[arg(long, default_value_t = 1)]
    retries: u32,

    /// Delay between retries, in seconds
    #[arg(long, default_value_t = 300)]
    retry_delay: u64,

    /// Interval between runs, in hours
    #[arg(long, default_value_t = 24)]
    interval: u64,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[derive(Deserialize)]
struct SchedulerConfig {
    file_path: String,
    preprocess_url: String,
    push_summary_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = load_config(&args.config)?;
    info!("scheduler starting, target {}", config.preprocess_url);

    let client = reqwest::Client::new();
    loop {
        let succeeded = run_with_retries(&client, &config, args.retries, args.retry_delay).await;
        if args.once {
            if !succeeded {
                bail!("run failed after {} attempts", args.retries + 1);
            }
            return Ok(());
        }
        info!("next run in {} hours", args.interval);
        tokio::time::sleep(std::time::Duration::from_secs(args.interval * 3600)).await;
    }
}

fn load_config(path: &PathBuf) -> Result<SchedulerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("configuration file not found: {}", path.display()))?;
    let config: SchedulerConfig = serde_json::from_str(&content)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    if config.file_path.is_empty() {
        bail!("file_path not provided in {}", path.display());
    }
    Ok(config)
}

async fn run_with_retries(
    client: &reqwest::Client,
    config: &SchedulerConfig,
    retries: u32,
    retry_delay: u64,
) -> bool {
    for attempt in 0..=retries {
        match run_sequence(client, config).await {
            Ok(()) => {
                info!("run complete");
                return true;
            }
            Err(e) if attempt < retries => {
                warn!(
                    "attempt {} failed: {} - retrying in {}s",
                    attempt + 1,
                    e,
                    retry_delay
                );
                tokio::time::sleep(std::time::Duration::from_secs(retry_delay)).await;
            }
            Err(e) => {
                error!("run failed after {} attempts: {}", retries + 1, e);
            }
        }
    }
    false
}

/// Preprocess, then push, in strict sequence. The push is never attempted
/// when preprocess fails.
async fn run_sequence(client: &reqwest::Client, config: &SchedulerConfig) -> Result<()> {
    let response = client
        .post(&config.preprocess_url)
        .json(&serde_json::json!({ "file_path": config.file_path }))
        .send()
        .await
        .context("preprocess call failed")?;
    if !response.status().is_success() {
        bail!("preprocess failed: {}", remote_error(response).await);
    }
    info!("preprocess succeeded");

    let response = client
        .post(&config.push_summary_url)
        .send()
        .await
        .context("push call failed")?;
    if !response.status().is_success() {
        bail!("summary push failed: {}", remote_error(response).await);
    }
    info!("summary push succeeded");
    Ok(())
}

async fn remote_error(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<serde_json::Value>().await {
        Ok(body) => body["error"]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("status {}", status)),
        Err(_) => format!("status {}", status),
    }
}
