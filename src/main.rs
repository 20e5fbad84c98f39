//! Binary entry point: parse configuration, wire the state graph, serve.

use anyhow::{anyhow, Result};
use clap::Parser;
use researchd_lib::config::{Cli, ServerConfig};
use researchd_lib::generation::{
    ChatResponder, CommandGenerator, ResearchGenerator, StaticGenerator, StaticResponder,
};
use researchd_lib::server::{run_server, ServerAppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_cli(Cli::parse());

    let (generator, responder): (Arc<dyn ResearchGenerator>, Arc<dyn ChatResponder>) =
        match &config.generator_cmd {
            Some(command_line) => {
                let command = Arc::new(
                    CommandGenerator::from_command_line(command_line).map_err(|e| anyhow!(e))?,
                );
                log::info!("Using external generator: {}", command_line);
                (command.clone(), command)
            }
            None => {
                log::warn!(
                    "No generator command configured; using the built-in static generator"
                );
                (Arc::new(StaticGenerator), Arc::new(StaticResponder))
            }
        };

    let state = ServerAppState::new(&config, generator, responder)
        .map_err(|e| anyhow!("failed to initialize state: {}", e))?;

    // Ctrl-C requests a graceful shutdown; in-flight requests drain.
    let shutdown_state = state.shutdown_state.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_state.request_shutdown();
        }
    });

    log::info!(
        "Starting researchd on {}:{} (data dir {:?}, docs {:?})",
        config.host,
        config.port,
        config.data_dir,
        config.doc_path
    );

    run_server(config.port, &config.host, state, config.cors_origins.clone())
        .await
        .map_err(|e| anyhow!(e))
}
