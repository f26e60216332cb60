//! Command-line surface: global overrides plus the batch subcommands used
//! in CI, where the console would otherwise be started.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::device::DeviceInfo;

/// TWAIN Direct scanner certification console.
#[derive(Debug, Parser)]
#[command(name = "twain-certify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file, instead of `.twaindirect/config.json`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Certification suite folder.
    #[arg(long, global = true)]
    pub suite: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `twain_certify=trace`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Talk plain HTTP to the scanner.
    #[arg(long, global = true)]
    pub http: bool,

    /// Scanner to add to discovery, as `name@host[:port]`.
    #[arg(long = "device", value_name = "NAME@HOST[:PORT]", global = true, value_parser = DeviceInfo::from_spec)]
    pub devices: Vec<DeviceInfo>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Select a scanner, open a session, run the suite and close.
    ///
    /// Exits with status 1 when any check failed or the suite could not be read.
    Certify {
        /// Pattern matched against scanner name, address or note.
        #[arg(long)]
        select: Option<String>,
    },

    /// Print the scanners known to discovery.
    List,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(suite) = &self.suite {
            config.suite_dir = suite.clone();
        }
        if self.http {
            config.use_https = false;
        }
        config.devices.extend(self.devices.iter().cloned());
        config
    }
}
