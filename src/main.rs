//! CLI entry point for scan-rig.
//!
//! Provides a command-line interface for exercising the completion correlator
//! against the in-memory service doubles. The demo run is the same correlated
//! flow the integration suite drives against a deployed service: register
//! handlers, submit a plan, check the task status, and wait for the terminal
//! `FINISHED` event.
//!
//! # Usage
//!
//! ```bash
//! scan-rig demo
//! scan-rig demo --plan snapshot
//! scan-rig --config config/scan-rig.toml demo
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use scan_rig::bus::EventBusClient;
use scan_rig::config::RigConfig;
use scan_rig::correlator::CompletionCorrelator;
use scan_rig::logging;
use scan_rig::message::{Message, Payload, STATUS_FINISHED};
use scan_rig::plans;
use scan_rig::submission::{TaskRequest, TaskSubmissionClient};
use scan_rig::testing::{InMemoryBroker, ScriptedTaskClient};

#[derive(Parser)]
#[command(name = "scan-rig", version)]
#[command(about = "Correlated scan-completion test rig", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one correlated plan against the in-memory service doubles
    Demo {
        /// Plan to submit (snapshot, spectroscopy, count)
        #[arg(long, default_value = "count")]
        plan: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RigConfig::load_from(path)?,
        None => RigConfig::load()?,
    };
    config.validate()?;
    logging::init_from_config(&config)?;

    match cli.command {
        Commands::Demo { plan } => demo(&config, &plan).await,
    }
}

fn demo_request(config: &RigConfig, plan: &str) -> Result<TaskRequest> {
    let session = config.scan.instrument_session.as_str();
    match plan {
        "snapshot" => Ok(plans::snapshot(session)),
        "spectroscopy" => Ok(plans::spectroscopy(session)),
        "count" => Ok(plans::count(session, &["imaging_detector"], 5)),
        other => bail!("Unknown plan '{other}'. Known plans: snapshot, spectroscopy, count"),
    }
}

async fn demo(config: &RigConfig, plan: &str) -> Result<()> {
    let request = demo_request(config, plan)?;
    info!(plan = %request.name, topic = %config.scan.topic, "starting demo run");

    let broker = Arc::new(InMemoryBroker::new());

    // The scripted service publishes the events a real plan run would raise,
    // after the correlator has registered its handlers.
    let publisher = Arc::clone(&broker);
    let topic = config.scan.topic.clone();
    let finished_payload: Payload = json!({"scanDimensions": [1]})
        .as_object()
        .cloned()
        .unwrap_or_default();
    let tasks = ScriptedTaskClient::completing().on_submit(move || {
        publisher.publish(Message::new(topic.as_str(), "STARTED"));
        publisher.publish(
            Message::new(topic.as_str(), STATUS_FINISHED).with_payload(finished_payload.clone()),
        );
    });

    let mut correlator = CompletionCorrelator::new(
        Arc::new(tasks) as Arc<dyn TaskSubmissionClient>,
        Arc::clone(&broker) as Arc<dyn EventBusClient>,
        &config.scan.topic,
    );

    let log = correlator
        .run(&request, config.scan.default_timeout)
        .await?;

    info!(events = log.total(), "demo run completed");
    println!("{}", serde_json::to_string_pretty(&log)?);
    Ok(())
}
