mod certification;
mod cli;
mod config;
mod device;
mod history;
mod http;
mod json;
mod session;
mod storage;
mod terminal;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use device::{Discovery, StaticDiscovery};
use terminal::Terminal;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

// Logs go to stderr; stdout belongs to the console.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode, String> {
    let config = cli.apply(storage::load_config(cli.config.as_deref())?);
    let discovery = StaticDiscovery::new(config.devices.clone());

    match cli.command {
        Some(Commands::List) => {
            let snapshot = discovery.snapshot();
            if snapshot.is_empty() {
                println!("*** no TWAIN Local scanners ***");
            }
            for device in snapshot {
                println!("{device}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Certify { select }) => {
            let mut terminal = Terminal::new(config, discovery, storage::load_history()?);
            if terminal.certify_once(select.as_deref(), None).await {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        None => {
            let mut terminal = Terminal::new(config, discovery, storage::load_history()?);
            terminal.repl().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
