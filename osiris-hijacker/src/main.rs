use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::info;

use osiris_hijacker::config::{Args, Config};
use osiris_hijacker::planner::SelectorHijacker;
use osiris_hijacker::server::{Exit, Hijacker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse the CLI arguments
    let args = Args::try_parse()?;

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        // all spans/events with a level higher than the requested one will be written to stdout.
        .with_max_level(args.log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Parsed CLI arguments: {:?}", args);

    let config = Config::from_args(&args).context("Failed to load configuration")?;
    let hijacker = Hijacker::new(config, Arc::new(SelectorHijacker))?;

    // Kubernetes stops pods with SIGTERM, Ctrl+C is for local runs.
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    tracing::error!("Failed to listen for CTRL+C: {:?}", err);
                    terminate.recv().await;
                }
            }
            _ = terminate.recv() => {}
        }
        token.cancel();
    });

    let exit = match hijacker.run(shutdown).await {
        Ok(exit) => exit,
        Err(err) => {
            tracing::error!("Endpoints hijacker error: {:#}", err);
            return Err(err);
        }
    };

    info!("Exiting admission server");

    match exit {
        Exit::Terminated => Err(anyhow!("Endpoints hijacker stopped unexpectedly")),
        Exit::Graceful | Exit::GraceExpired => Ok(()),
    }
}
