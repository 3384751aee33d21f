//! Command-line entry point: wires settings, adapters and the client
//! context, then runs one command.

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use client::domain::{ClientContext, Session};
use client::inbound::cli::{Cli, run};
use client::outbound::{DirectorySink, FileSessionStore, HttpGateway};
use client::ClientSettings;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    // Settings come from the environment and config files only; the
    // command line belongs to clap.
    let settings = ClientSettings::load_from_iter([OsString::from("taskboard")])
        .map_err(|err| eyre!("failed to load settings: {err}"))?;

    let store = FileSessionStore::open(settings.state_dir())
        .wrap_err_with(|| format!("failed to open state directory {:?}", settings.state_dir()))?;
    let session = Arc::new(Session::bootstrap(Arc::new(store)));
    let gateway = HttpGateway::new(settings.base_url(), settings.timeout(), Arc::clone(&session))
        .wrap_err("failed to build HTTP gateway")?;
    let sink = DirectorySink::open(settings.download_dir()).wrap_err_with(|| {
        format!(
            "failed to open download directory {:?}",
            settings.download_dir()
        )
    })?;
    let context = ClientContext::new(Arc::new(gateway), session, Arc::new(sink));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli.command, &context, &mut out).await?;
    out.flush()?;
    Ok(())
}
