use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use ticcmd::{MockTic, TicClient};
use tracing::{info, warn};
use utilities::{command_executor::CommandExecutor, paths::expand_home};

use crate::{
    command_executor::switchboard::{SwitchboardHandler, command_sender::SwitchboardCommandSender},
    config::{ConfigOptions, DEFAULT_CONFIG_PATH, init_config_with_options},
    controllers::switchboard::Switchboard,
};

pub mod command_executor;
pub mod communication;
pub mod config;
pub mod controllers;
pub mod logging;
pub mod models;

const SIMULATED_START_POSITION: i32 = 0;

#[derive(Debug, Parser)]
#[command(name = "antenna-switch", about = "Web control panel for a stepper-driven antenna switch")]
struct Cli {
    /// Path to the JSON configuration file; created with defaults when missing.
    #[arg(long, env = "CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Directory for daily rolling log files.
    #[arg(long, env = "LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Drive an in-memory simulated controller instead of `ticcmd`.
    #[arg(long)]
    simulate: bool,

    /// Log every `ticcmd` invocation and its output.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.log_dir.as_deref())?;

    let config_path = expand_home(&cli.config).context("unable to open config")?;
    info!(path = %config_path.display(), "reading config");

    let (_config_manager, config) = init_config_with_options(ConfigOptions::with_path(&config_path))
        .with_context(|| format!("error reading config file {}", config_path.display()))?;

    let ports = config.port_map()?;
    let addr = config.listen_addr()?;
    info!(
        ports = ?ports.ports().iter().map(|p| p.label.as_str()).collect::<Vec<_>>(),
        "{} ports configured",
        ports.ports().len()
    );

    let client = if cli.simulate {
        warn!("using simulated controller");
        TicClient::with_runner(MockTic::new(SIMULATED_START_POSITION))
    } else {
        TicClient::new(&config.ticcmd_path, config.debug || cli.debug)
            .context("error creating ticcmd client")?
    };

    let switchboard = Switchboard::new(client, ports).context("error querying controller status")?;

    let executor = CommandExecutor::new(SwitchboardHandler::new(switchboard));
    let sender = SwitchboardCommandSender::new(executor.sender());
    let executor_handle = executor.spawn();

    communication::serve(addr, sender).await?;

    let _handler = executor_handle.await?;
    info!("switchboard stopped");

    Ok(())
}
