//! NeuroFetch Server — application entry point.

use clap::Parser;
use neurofetch_server::{AppState, ServerArgs, StartupError, router};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, LevelFilter};

#[tokio::main]
async fn main() {
    let default_directive: Directive = match "neurofetch=info".parse() {
        Ok(d) => d,
        Err(_) => Directive::from(LevelFilter::INFO),
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive))
        .json()
        .init();

    if let Err(e) = run(ServerArgs::parse()).await {
        error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn run(args: ServerArgs) -> Result<(), StartupError> {
    info!("Starting NeuroFetch server...");

    let addr = args.bind_addr()?;
    let state = AppState::build(&args.db_config(), args.auth_config(), args.pepper.clone()).await?;

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("NeuroFetch server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down gracefully"),
        () = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
