//! Runs one test model end to end against a Storm appliance.
//!
//! Configuration comes from the environment: `STORM_HOST`, `STORM_USER`,
//! `STORM_PASS`, `STORM_MODEL`, `STORM_NETWORK`, `STORM_COMPONENTS`
//! (comma-separated component labels to keep active), and optionally
//! `STORM_SLOT`, `STORM_PORTS`, `STORM_CHECK_VERSION`, `STORM_PROFILE`.

#![warn(clippy::unwrap_used)]

use std::env;

use anyhow::{bail, Context, Result};
use stormsim::{run_model, RunConfig, RunOutcome, Session, CLIENT_VERSION};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = config_from_env()?;
    let host = require_env("STORM_HOST")?;
    let user = require_env("STORM_USER")?;
    let password = require_env("STORM_PASS")?;
    let check_version = env_flag("STORM_CHECK_VERSION", true);
    let profile = env_flag("STORM_PROFILE", false);

    let session = Session::new(host, user, password, check_version)?;
    session.enable_profiling(profile);
    session.login().await.context("login failed")?;
    info!(
        client = CLIENT_VERSION,
        server = session.server_version().as_deref().unwrap_or("n/a"),
        "session established"
    );

    let report = run_model(&session, &cfg).await.context("model run failed")?;

    match report.outcome {
        RunOutcome::Completed => info!(
            run_id = report.run_id,
            final_progress = report.final_progress,
            "run completed"
        ),
        RunOutcome::Unknown => warn!(
            run_id = report.run_id,
            "run ended with the status resource gone, outcome unknown"
        ),
    }
    for failure in &report.release_failures {
        warn!(
            slot = failure.slot,
            port = failure.port,
            error = %failure.error,
            "port was not released"
        );
    }
    println!("report section {}:\n{:#}", cfg.report_section, report.report_table);

    if profile {
        for entry in session.profiling_summary() {
            info!(
                verb = %entry.verb,
                path = %entry.path,
                count = entry.count,
                avg = entry.avg,
                min = entry.min,
                max = entry.max,
                "call timing"
            );
        }
    }
    Ok(())
}

fn config_from_env() -> Result<RunConfig> {
    let model = require_env("STORM_MODEL")?;
    let network = require_env("STORM_NETWORK")?;
    let active_components: Vec<String> = require_env("STORM_COMPONENTS")?
        .split(',')
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
        .collect();
    if active_components.is_empty() {
        bail!("STORM_COMPONENTS must name at least one component");
    }

    let mut cfg = RunConfig {
        model,
        network,
        active_components,
        ..RunConfig::default()
    };
    if let Ok(slot) = env::var("STORM_SLOT") {
        cfg.slot = slot.trim().parse().context("STORM_SLOT must be a number")?;
    }
    if let Ok(ports) = env::var("STORM_PORTS") {
        cfg.ports = ports
            .split(',')
            .map(|port| {
                port.trim()
                    .parse::<u32>()
                    .with_context(|| format!("bad port number {port:?} in STORM_PORTS"))
            })
            .collect::<Result<Vec<_>>>()?;
    }
    if cfg.ports.is_empty() {
        bail!("STORM_PORTS must name at least one port");
    }
    Ok(cfg)
}

fn require_env(name: &str) -> Result<String> {
    let value = env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .unwrap_or_default();
    if value.is_empty() {
        bail!("{name} must be set");
    }
    Ok(value)
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => matches!(value.trim(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}
