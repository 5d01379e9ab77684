use std::{net::SocketAddr, sync::Arc};

use axum::{extract::State, routing::any, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{browser::Launcher, error::Result, session::Orchestrator};

/// Every request triggers one run with retries. The reply is always `OK`;
/// failures only show up in the logs.
async fn trigger<L: Launcher>(State(orchestrator): State<Arc<Orchestrator<L>>>) -> &'static str {
    let _ = orchestrator.run_with_retries().await;
    "OK"
}

pub fn router<L: Launcher>(orchestrator: Arc<Orchestrator<L>>) -> Router {
    Router::new()
        .route("/", any(trigger::<L>))
        .with_state(orchestrator)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve<L: Launcher>(port: u16, orchestrator: Arc<Orchestrator<L>>) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    log::info!("listening on http://{addr}");
    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}
