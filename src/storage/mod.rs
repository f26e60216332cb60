use std::fs;
use std::path::{Path, PathBuf};

use crate::certification::CertificationReport;
use crate::config::Config;
use crate::history::RunHistory;

const DATA_DIR: &str = ".twaindirect";
const CONFIG_FILE: &str = "config.json";
const HISTORY_FILE: &str = "history.json";
const REPORTS_DIR: &str = "reports";

/// Load the config from `path`, or from the data directory when no path
/// is given. A missing default file yields the default config.
pub fn load_config(path: Option<&Path>) -> Result<Config, String> {
    let file = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let file = data_dir().join(CONFIG_FILE);
            if !file.exists() {
                return Ok(Config::default());
            }
            file
        }
    };

    let raw = fs::read_to_string(&file)
        .map_err(|e| format!("Failed to read config file `{}`: {e}", file.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config file `{}`: {e}", file.display()))
}

pub fn load_history() -> Result<RunHistory, String> {
    load_history_from(&data_dir())
}

pub fn save_history(history: &RunHistory) -> Result<(), String> {
    save_history_to(&data_dir(), history)
}

pub fn save_report(timestamp: u64, report: &CertificationReport) -> Result<PathBuf, String> {
    save_report_to(&data_dir(), timestamp, report)
}

fn load_history_from(dir: &Path) -> Result<RunHistory, String> {
    let file = dir.join(HISTORY_FILE);
    if !file.exists() {
        return Ok(RunHistory::new());
    }

    let raw = fs::read_to_string(&file)
        .map_err(|e| format!("Failed to read history file `{}`: {e}", file.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse history file `{}`: {e}", file.display()))
}

fn save_history_to(dir: &Path, history: &RunHistory) -> Result<(), String> {
    ensure_dir(dir)?;
    let file = dir.join(HISTORY_FILE);
    let raw =
        serde_json::to_string_pretty(history).map_err(|e| format!("Failed to serialize history: {e}"))?;
    fs::write(&file, raw).map_err(|e| format!("Failed to write history file `{}`: {e}", file.display()))
}

fn save_report_to(dir: &Path, timestamp: u64, report: &CertificationReport) -> Result<PathBuf, String> {
    let reports = dir.join(REPORTS_DIR);
    ensure_dir(&reports)?;
    let file = reports.join(format!("{timestamp}.json"));
    let raw =
        serde_json::to_string_pretty(report).map_err(|e| format!("Failed to serialize report: {e}"))?;
    fs::write(&file, raw).map_err(|e| format!("Failed to write report file `{}`: {e}", file.display()))?;
    Ok(file)
}

fn data_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(DATA_DIR)
}

fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create data directory `{}`: {e}", path.display()))
}
