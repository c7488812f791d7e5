use std::net::SocketAddr;

use anyhow::Context as _;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

use crate::command_executor::switchboard::command_sender::SwitchboardCommandSender;

pub mod http;

pub async fn serve(addr: SocketAddr, switchboard: SwitchboardCommandSender) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding HTTP listener on {addr}"))?;

    info!(%addr, "listening for HTTP traffic");

    axum::serve(listener, http::router(switchboard).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal as unix_signal};

    let terminate = async {
        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("received ctrl_c; shutting down");
        }
        _ = terminate => {
            info!("received SIGTERM; shutting down");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "unable to listen for ctrl_c");
        std::future::pending::<()>().await;
    }
    info!("received ctrl_c; shutting down");
}
