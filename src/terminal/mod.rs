//! # Operator Console
//!
//! Line-oriented front end over discovery, the session client and the
//! certification engine. Commands come from the prompt or from `.tdc`
//! scripts and go through the same dispatch table.

mod dispatch;
mod interpreter;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::certification::{self, CertificationReport, RunOptions};
use crate::config::Config;
use crate::device::{self, DeviceInfo, Discovery};
use crate::history::{RunHistory, RunRecord};
use crate::json::{JsonLookup, JsonPath};
use crate::session::{Exchange, SessionClient, TwainLocalClient};
use crate::storage;

pub use dispatch::{Command, lookup};
pub use interpreter::{prompt, tokenize};

const SCRIPT_EXTENSION: &str = "tdc";
const RECENT_RUNS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Terminal<D: Discovery> {
    config: Config,
    discovery: D,
    snapshot: Vec<DeviceInfo>,
    selected: Option<DeviceInfo>,
    client: Option<TwainLocalClient>,
    history: RunHistory,
}

impl<D: Discovery> Terminal<D> {
    pub fn new(config: Config, discovery: D, history: RunHistory) -> Self {
        let mut terminal = Self {
            config,
            discovery,
            snapshot: Vec::new(),
            selected: None,
            client: None,
            history,
        };
        terminal.list(true);
        terminal
    }

    pub fn prompt(&self) -> String {
        prompt(self.client.as_ref().map(|client| client.state()).as_ref())
    }

    /// Read commands from stdin until `quit` or end of input.
    pub async fn repl(&mut self) -> Result<(), String> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("{}", self.prompt());
            std::io::stdout()
                .flush()
                .map_err(|e| format!("Failed to write console prompt: {e}"))?;

            let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| format!("Failed to read console input: {e}"))?
            else {
                break;
            };
            if self.execute_line(&line).await == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    pub async fn execute_line(&mut self, line: &str) -> Flow {
        let tokens = tokenize(line.trim());
        let Some(first) = tokens.first() else {
            return Flow::Continue;
        };
        match lookup(first) {
            Some(Command::Run) => {
                self.run_script(tokens.get(1).map(String::as_str)).await;
                Flow::Continue
            }
            Some(command) => self.execute(command, &tokens[1..]).await,
            None => {
                println!("unrecognized command: {first}");
                Flow::Continue
            }
        }
    }

    async fn execute(&mut self, command: Command, args: &[String]) -> Flow {
        let arg = args.first().map(String::as_str);
        match command {
            Command::CloseSession => self.close_session().await,
            Command::CreateSession => self.create_session().await,
            Command::GetSession => self.get_session().await,
            Command::Infoex => self.infoex().await,
            Command::SendTask => self.send_task(arg).await,
            Command::StartCapturing => self.start_capturing().await,
            Command::StopCapturing => self.stop_capturing().await,
            Command::ReleaseImageBlocks => self.release_image_blocks(args).await,
            Command::Certify => {
                self.certify(arg.map(Path::new)).await;
            }
            Command::Help => help(arg),
            Command::List => self.list(false),
            Command::Quit => return Flow::Quit,
            Command::Run => println!("scripts cannot run other scripts"),
            Command::Select => self.select(arg),
            Command::Sleep => sleep(arg).await,
            Command::Status => self.status(),
        }
        Flow::Continue
    }

    /// Non-interactive run: select, open a session, certify, close.
    /// Returns true only when the suite ran and nothing failed.
    pub async fn certify_once(&mut self, pattern: Option<&str>, suite: Option<&Path>) -> bool {
        self.select(pattern);
        let Some((device, client)) = self.target() else {
            return false;
        };
        if let Err(e) = open_session(client, device).await {
            error!("{e}");
            println!("{e}");
            return false;
        }
        let report = self.certify(suite).await;
        self.close_session().await;
        report.is_some_and(|report| report.passed())
    }

    /// Refresh the snapshot, printing it unless `silent`.
    pub fn list(&mut self, silent: bool) {
        self.snapshot = self.discovery.snapshot();
        if silent {
            return;
        }
        if self.snapshot.is_empty() {
            println!("*** no TWAIN Local scanners ***");
        }
        for device in &self.snapshot {
            println!("{device}");
        }
    }

    pub fn select(&mut self, pattern: Option<&str>) {
        self.selected = None;
        self.client = None;

        if self.snapshot.is_empty() {
            self.list(true);
        }
        if self.snapshot.is_empty() {
            println!("*** no TWAIN Local scanners ***");
            return;
        }

        let Some(device) = device::select_device(&self.snapshot, pattern).cloned() else {
            println!("*** no selection matches ***");
            return;
        };
        match TwainLocalClient::new(&self.config.session_options()) {
            Ok(client) => {
                println!("{device}");
                info!(device = %device.name, "scanner selected");
                self.selected = Some(device);
                self.client = Some(client);
            }
            Err(e) => {
                error!(device = %device.name, "{e}");
                println!("{e}");
            }
        }
    }

    fn target(&mut self) -> Option<(&DeviceInfo, &mut TwainLocalClient)> {
        match (self.selected.as_ref(), self.client.as_mut()) {
            (Some(device), Some(client)) => Some((device, client)),
            _ => {
                println!("must first select a scanner...");
                None
            }
        }
    }

    async fn infoex(&mut self) {
        let Some((device, client)) = self.target() else {
            return;
        };
        let mut exchange = Exchange::new(Some(device));
        client.info(device, &mut exchange).await;
        show(&exchange);
    }

    async fn create_session(&mut self) {
        let Some((device, client)) = self.target() else {
            return;
        };
        let mut exchange = Exchange::new(Some(device));
        client.create_session(device, &mut exchange).await;
        show(&exchange);
    }

    async fn get_session(&mut self) {
        let Some((device, client)) = self.target() else {
            return;
        };
        let mut exchange = Exchange::new(Some(device));
        client.get_session(&mut exchange).await;
        show(&exchange);
    }

    async fn start_capturing(&mut self) {
        let Some((device, client)) = self.target() else {
            return;
        };
        let mut exchange = Exchange::new(Some(device));
        client.start_capturing(&mut exchange).await;
        show(&exchange);
    }

    async fn stop_capturing(&mut self) {
        let Some((device, client)) = self.target() else {
            return;
        };
        let mut exchange = Exchange::new(Some(device));
        client.stop_capturing(&mut exchange).await;
        show(&exchange);
    }

    async fn release_image_blocks(&mut self, args: &[String]) {
        let Some((device, client)) = self.target() else {
            return;
        };
        let (first, last) = match parse_block_range(args) {
            Ok(range) => range,
            Err(message) => {
                println!("{message}");
                return;
            }
        };
        let mut exchange = Exchange::new(Some(device));
        client.release_image_blocks(first, last, &mut exchange).await;
        show(&exchange);
    }

    async fn close_session(&mut self) {
        let Some((device, client)) = self.target() else {
            return;
        };
        let mut exchange = Exchange::new(Some(device));
        client.close_session(&mut exchange).await;
        show(&exchange);
    }

    async fn send_task(&mut self, arg: Option<&str>) {
        let Some((device, client)) = self.target() else {
            return;
        };
        let Some(arg) = arg else {
            println!("must supply a task...");
            return;
        };

        let task = if Path::new(arg).is_file() {
            match std::fs::read_to_string(arg) {
                Ok(task) => task,
                Err(e) => {
                    println!("failed to open file...<{arg}> - {e}");
                    return;
                }
            }
        } else {
            arg.to_string()
        };

        let mut exchange = Exchange::new(Some(device));
        client.send_task(&task, &mut exchange).await;
        show(&exchange);
    }

    async fn certify(&mut self, suite: Option<&Path>) -> Option<CertificationReport> {
        let suite_root = suite
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.suite_dir.clone());
        let expects_mode = self.config.expects_mode;
        let (device, client) = self.target()?;
        let options = RunOptions {
            expects_mode,
            device: Some(device.clone()),
        };

        let report = match certification::run_certification(&suite_root, client, &options).await {
            Ok(report) => report,
            Err(e) => {
                error!(suite = %suite_root.display(), "{e}");
                println!("{e}");
                return None;
            }
        };

        for finding in report.failures() {
            println!("{} {}: {}", finding.test, finding.check, finding.message);
        }
        for line in report.counters.summary_lines() {
            println!("{line}");
        }
        self.remember(options.device.map(|device| device.name), &report);
        Some(report)
    }

    fn remember(&mut self, device: Option<String>, report: &CertificationReport) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();

        self.history.push(RunRecord {
            timestamp,
            device,
            counters: report.counters,
        });
        if let Err(e) = storage::save_history(&self.history) {
            warn!("{e}");
        }
        match storage::save_report(timestamp, report) {
            Ok(file) => println!("report saved to {}", file.display()),
            Err(e) => warn!("{e}"),
        }
    }

    async fn run_script(&mut self, script: Option<&str>) {
        let Some(script) = script else {
            list_scripts(Path::new("."));
            return;
        };
        let Some(file) = resolve_script(script) else {
            println!("script not found");
            return;
        };
        let text = match std::fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) => {
                println!("failed to read script: {e}");
                return;
            }
        };

        for line in text.lines() {
            let line = line.trim();
            println!("{}{line}", self.prompt());
            let tokens = tokenize(line);
            let Some(first) = tokens.first() else {
                continue;
            };
            let flow = match lookup(first) {
                Some(command) => self.execute(command, &tokens[1..]).await,
                None => {
                    println!("unrecognized command: {first}");
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                break;
            }
        }
    }

    fn status(&self) {
        println!("SELECTED SCANNER");
        match &self.selected {
            Some(device) => println!("{device}"),
            None => println!("*** no selected scanner ***"),
        }

        println!();
        println!("LAST SCANNER LIST SNAPSHOT");
        if self.snapshot.is_empty() {
            println!("*** no TWAIN Local scanners ***");
        }
        for device in &self.snapshot {
            println!("{device}");
        }

        if let Some(client) = &self.client {
            println!();
            println!("SESSION STATE");
            println!("{}", client.state());
        }

        println!();
        println!("RECENT CERTIFICATION RUNS");
        if self.history.entries().is_empty() {
            println!("*** no certification runs ***");
        }
        for record in self.history.entries().iter().take(RECENT_RUNS) {
            let counters = record.counters;
            println!(
                "{} {} pass:{} fail:{} skip:{} total:{}",
                record.timestamp,
                record.device.as_deref().unwrap_or("-"),
                counters.pass,
                counters.fail,
                counters.skip,
                counters.total
            );
        }
    }
}

/// infoex then createSession, stopping at the first command without a
/// successful reply.
pub async fn open_session<C: SessionClient>(client: &mut C, device: &DeviceInfo) -> Result<(), String> {
    let mut exchange = Exchange::new(Some(device));
    client.info(device, &mut exchange).await;
    show(&exchange);
    if !exchange.succeeded() {
        return Err(format!("infoex failed: {}", failure_reason(&exchange)));
    }

    let mut exchange = Exchange::new(Some(device));
    client.create_session(device, &mut exchange).await;
    show(&exchange);
    if !exchange.succeeded() || !reply_succeeded(&exchange) {
        return Err(format!("createSession failed: {}", failure_reason(&exchange)));
    }
    Ok(())
}

fn reply_succeeded(exchange: &Exchange) -> bool {
    JsonLookup::load(&exchange.response_body)
        .ok()
        .and_then(|reply| reply.text(&JsonPath::parse("results.success")))
        .is_some_and(|success| success == "true")
}

fn failure_reason(exchange: &Exchange) -> String {
    if let Some(error) = &exchange.error {
        return error.clone();
    }
    match JsonLookup::load(&exchange.response_body)
        .ok()
        .and_then(|reply| reply.text(&JsonPath::parse("results.code")))
    {
        Some(code) => format!("status {} code {code}", exchange.status),
        None => format!("status {}", exchange.status),
    }
}

fn parse_block_range(args: &[String]) -> Result<(u64, u64), &'static str> {
    let [first, last, ..] = args else {
        return Err("please specify the first and last image block to release...");
    };
    let first = first.parse::<u64>().map_err(|_| "first image block must be a number...")?;
    let last = last.parse::<u64>().map_err(|_| "last image block must be a number...")?;
    Ok((first, last))
}

fn show(exchange: &Exchange) {
    for line in exchange.transcript() {
        println!("{line}");
    }
}

fn help(arg: Option<&str>) {
    let lines = match arg {
        None => dispatch::SUMMARY,
        Some(arg) => match lookup(arg) {
            Some(command) => dispatch::help(command),
            None => {
                println!("unrecognized command: {arg}");
                return;
            }
        },
    };
    for line in lines {
        println!("{line}");
    }
}

async fn sleep(arg: Option<&str>) {
    let millis = parse_millis(arg);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

/// Missing, malformed and negative values all mean no wait.
fn parse_millis(arg: Option<&str>) -> u64 {
    arg.and_then(|arg| arg.parse::<i64>().ok())
        .map(|millis| millis.max(0).unsigned_abs())
        .unwrap_or(0)
}

fn resolve_script(script: &str) -> Option<PathBuf> {
    let file = PathBuf::from(script);
    if file.is_file() {
        return Some(file);
    }
    let file = PathBuf::from(format!("{script}.{SCRIPT_EXTENSION}"));
    file.is_file().then_some(file)
}

fn script_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION))
        .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

fn list_scripts(dir: &Path) {
    let names = script_names(dir);
    if names.is_empty() {
        println!("no script files found");
    }
    println!("SCRIPT FILES");
    for name in names {
        println!("{name}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::StaticDiscovery;
    use crate::session::fake::ScriptedClient;

    fn device(name: &str, ipv4: &str, note: &str) -> DeviceInfo {
        DeviceInfo {
            name: name.into(),
            ipv4: Some(ipv4.into()),
            ipv6: None,
            port: device::DEFAULT_PORT,
            note: note.into(),
        }
    }

    fn terminal(devices: Vec<DeviceInfo>) -> Terminal<StaticDiscovery> {
        Terminal::new(Config::default(), StaticDiscovery::new(devices), RunHistory::new())
    }

    #[test]
    fn select_without_pattern_takes_first() {
        let mut terminal = terminal(vec![
            device("alpha", "10.0.0.5", "front desk"),
            device("beta", "10.0.0.6", "lab"),
        ]);
        terminal.select(None);

        assert_eq!(terminal.selected.as_ref().map(|d| d.name.as_str()), Some("alpha"));
        assert!(terminal.client.is_some());
        assert_eq!(terminal.prompt(), "tdc>>> ");
    }

    #[test]
    fn select_matches_note_and_clears_on_miss() {
        let mut terminal = terminal(vec![
            device("alpha", "10.0.0.5", "front desk"),
            device("beta", "10.0.0.6", "lab"),
        ]);
        terminal.select(Some("lab"));
        assert_eq!(terminal.selected.as_ref().map(|d| d.name.as_str()), Some("beta"));

        terminal.select(Some("nowhere"));
        assert!(terminal.selected.is_none());
        assert!(terminal.client.is_none());
    }

    #[test]
    fn select_with_no_scanners_selects_nothing() {
        let mut terminal = terminal(Vec::new());
        terminal.select(None);
        assert!(terminal.selected.is_none());
    }

    #[tokio::test]
    async fn api_commands_require_selection() {
        let mut terminal = terminal(vec![device("alpha", "10.0.0.5", "")]);
        assert_eq!(terminal.execute_line("infoex").await, Flow::Continue);
        assert_eq!(terminal.execute_line("sendtask {}").await, Flow::Continue);
        assert!(terminal.certify(None).await.is_none());
        assert!(terminal.history.entries().is_empty());
    }

    #[tokio::test]
    async fn quit_aliases_stop_the_console() {
        let mut terminal = terminal(Vec::new());
        assert_eq!(terminal.execute_line("").await, Flow::Continue);
        assert_eq!(terminal.execute_line("bogus").await, Flow::Continue);
        assert_eq!(terminal.execute_line("EXIT").await, Flow::Quit);
        assert_eq!(terminal.execute_line("q").await, Flow::Quit);
    }

    #[tokio::test]
    async fn certify_once_without_scanners_fails() {
        let mut terminal = terminal(Vec::new());
        assert!(!terminal.certify_once(None, None).await);
    }

    #[tokio::test]
    async fn comment_lines_are_ignored() {
        let mut terminal = terminal(Vec::new());
        assert_eq!(terminal.execute_line("; quit").await, Flow::Continue);
        assert_eq!(terminal.execute_line(":top").await, Flow::Continue);
    }

    #[tokio::test]
    async fn open_session_succeeds_with_ready_session() {
        let mut client = ScriptedClient::replying(&[
            r#"{"version":"1.0","x-privet-token":"t"}"#,
            r#"{"results":{"success":true,"session":{"sessionId":"s1","state":"ready"}}}"#,
        ]);
        let lab = device("lab", "10.0.0.5", "");
        assert_eq!(open_session(&mut client, &lab).await, Ok(()));
        assert!(client.replies.is_empty());
    }

    #[tokio::test]
    async fn open_session_stops_when_create_session_is_refused() {
        let mut client = ScriptedClient::replying(&[
            r#"{"version":"1.0"}"#,
            r#"{"results":{"success":false,"code":"busy"}}"#,
            r#"{"results":{"success":true}}"#,
        ]);
        let lab = device("lab", "10.0.0.5", "");
        let err = open_session(&mut client, &lab).await.unwrap_err();

        assert_eq!(err, "createSession failed: status 200 code busy");
        assert_eq!(client.replies.len(), 1);
    }

    #[tokio::test]
    async fn open_session_stops_when_infoex_gets_no_reply() {
        let mut client = ScriptedClient::new([Err("connection refused".to_string())]);
        let lab = device("lab", "10.0.0.5", "");
        let err = open_session(&mut client, &lab).await.unwrap_err();

        assert_eq!(err, "infoex failed: connection refused");
    }

    #[test]
    fn block_range_needs_two_numbers() {
        let args = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(parse_block_range(&args(&["1", "4"])), Ok((1, 4)));
        assert_eq!(
            parse_block_range(&args(&["1"])),
            Err("please specify the first and last image block to release...")
        );
        assert_eq!(
            parse_block_range(&args(&["x", "4"])),
            Err("first image block must be a number...")
        );
        assert_eq!(
            parse_block_range(&args(&["1", "-4"])),
            Err("last image block must be a number...")
        );
    }

    #[test]
    fn sleep_argument_is_clamped() {
        assert_eq!(parse_millis(Some("250")), 250);
        assert_eq!(parse_millis(Some("-5")), 0);
        assert_eq!(parse_millis(Some("soon")), 0);
        assert_eq!(parse_millis(None), 0);
    }

    #[test]
    fn scripts_are_listed_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("smoke.tdc"), "list\n").unwrap();
        std::fs::write(dir.path().join("basic.tdc"), "status\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        assert_eq!(script_names(dir.path()), vec!["basic", "smoke"]);
    }
}
