// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use osprobe_client::MinimumStatus;
use osprobe_config::{load as load_config, AppConfig};
use osprobe_core::Probe;
use tracing::{error, info};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Wait for an OpenSearch cluster to become healthy, then create a test index.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file layered over the defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lowest acceptable cluster health (yellow or green).
    #[arg(short, long)]
    minimum_status: Option<MinimumStatus>,

    /// Name of the index to create.
    #[arg(short, long)]
    index: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let filter = init_tracing();
    let config = apply_overrides(load_config(args.config.as_deref())?, &args);
    apply_log_level(
        &filter,
        &config.telemetry.log_level,
        std::env::var_os(EnvFilter::DEFAULT_ENV).is_some(),
    )?;

    info!(
        target: "cli",
        "probing {} for {} health",
        config.connection.base_url(),
        config.health.minimum_status
    );

    match Probe::from_config(&config)?.run().await {
        Ok(report) => {
            info!(
                target: "cli",
                status = %report.health.status,
                elapsed = ?report.elapsed,
                "index {} created", config.index.name
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            error!(target: "cli", "{}", failure);
            eprintln!("{failure}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn apply_overrides(mut config: AppConfig, args: &Args) -> AppConfig {
    if let Some(minimum_status) = args.minimum_status {
        config.health.minimum_status = minimum_status;
    }
    if let Some(index) = &args.index {
        config.index.name = index.clone();
    }
    config
}

/// Install the subscriber before anything logs; the level from the config
/// file is applied later through the returned handle.
fn init_tracing() -> FilterHandle {
    let fmt_layer = fmt::layer().with_target(true).with_level(true);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    handle
}

/// `RUST_LOG` wins over the configured level when it is set.
fn apply_log_level(handle: &FilterHandle, level: &str, env_override: bool) -> Result<()> {
    if !env_override {
        handle.reload(EnvFilter::try_new(level)?)?;
    }
    info!(target: "cli", "log filter: {}", handle.with_current(|f| f.to_string())?);
    Ok(())
}
