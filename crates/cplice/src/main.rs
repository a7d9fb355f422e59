//! cplice - splice a data image onto a base image inside an OCI registry
//!
//! This is the main entry point for the cplice command-line interface.

mod cli;
mod observer;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use cplice_core::{DockerConfig, RuntimeConfigLoader};
use cplice_image::{RegistryPool, SpliceEngine, SpliceOptions};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use observer::ConsoleObserver;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let loader = RuntimeConfigLoader::new().context("Failed to locate configuration directory")?;
    debug!("Reading runtime configuration from {}", loader.config_dir());
    let runtime = loader
        .load()
        .context("Failed to load runtime configuration")?;

    let credentials = match &cli.auth_file {
        Some(path) => DockerConfig::from_path(path),
        None => DockerConfig::load(),
    }
    .context("Failed to load registry credentials")?;
    debug!("Using credentials from {}", credentials.path());

    let pool = RegistryPool::new(Arc::new(credentials), runtime);
    let verify_tls = !cli.insecure;

    let spinner = output::spinner("Reading base image");
    if cli.quiet {
        spinner.finish_and_clear();
    }

    let engine = SpliceEngine::resolve(
        &pool,
        &cli.basecontainer,
        &cli.datacontainer,
        &cli.newcontainer,
        verify_tls,
    )
    .context("Invalid image reference")?
    .with_options(SpliceOptions {
        destination_tag: cli.tag.clone(),
        check_layers: cli.check_layers,
    })
    .with_observer(ConsoleObserver::new(spinner.clone(), cli.quiet));

    let destination = format!(
        "{}/{}:{}",
        engine.new_image().reference().host,
        engine.new_image().reference().path,
        engine.destination_tag()
    );

    let result = engine.run().await;
    spinner.finish_and_clear();
    let outcome = result.with_context(|| format!("Failed to publish {}", destination))?;

    output::success(&format!(
        "Published {} ({} layers, config {})",
        destination,
        outcome.manifest.layers.len(),
        outcome.config_descriptor.digest
    ));
    Ok(())
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
