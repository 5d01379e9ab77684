#![deny(unused_crate_dependencies)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod browser;
mod config;
mod error;
#[cfg(test)]
mod fake;
mod intercept;
mod menu;
mod navigate;
mod server;
mod session;
mod telegram;

use std::sync::Arc;

use clap::Parser;

use crate::{
    browser::chromium::ChromiumLauncher,
    config::{Cli, Command},
    session::Orchestrator,
    telegram::TelegramApi,
};

#[cfg(all(target_env = "musl", target_pointer_width = "64"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> core::result::Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let Command::Run(args) = Cli::parse().command;
    let config = args.into_config()?;
    log::info!("Running bot");
    log::debug!("{config:?}");

    let telegram = Arc::new(TelegramApi::new(config.telegram.token.as_str())?);
    let orchestrator = Orchestrator::new(
        ChromiumLauncher::new(config.browser),
        telegram,
        config.telegram.personal_id,
        config.run,
    );

    if let Some(server) = config.server {
        log::info!("Running in server mode on port {}", server.port);
        if let Err(e) = server::serve(server.port, Arc::new(orchestrator)).await {
            log::error!("Failed to run server: {e}");
        }
        return Ok(());
    }

    if let Err(e) = orchestrator.run().await {
        log::error!("Failed to run handler: {e}");
    }
    Ok(())
}
