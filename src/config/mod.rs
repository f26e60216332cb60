//! Tool configuration, read from `.twaindirect/config.json`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::certification::ExpectsMode;
use crate::device::DeviceInfo;
use crate::http::client::ClientOptions;
use crate::session::TwainLocalOptions;

const DEFAULT_SUITE_DIR: &str = "tasks/certification";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub suite_dir: PathBuf,
    pub use_https: bool,
    pub use_infoex: bool,
    /// Scanners present self-signed certificates, so this is off by default.
    pub verify_ssl: bool,
    /// Per-request timeout. Absent means wait as long as the scanner takes.
    pub timeout_ms: Option<u64>,
    pub expects_mode: ExpectsMode,
    pub devices: Vec<DeviceInfo>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            suite_dir: PathBuf::from(DEFAULT_SUITE_DIR),
            use_https: true,
            use_infoex: true,
            verify_ssl: false,
            timeout_ms: None,
            expects_mode: ExpectsMode::Sentinel,
            devices: Vec::new(),
        }
    }
}

impl Config {
    pub fn session_options(&self) -> TwainLocalOptions {
        TwainLocalOptions {
            use_https: self.use_https,
            use_infoex: self.use_infoex,
            http: ClientOptions {
                timeout_ms: self.timeout_ms,
                verify_ssl: self.verify_ssl,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.use_https);
        assert!(!config.verify_ssl);
    }

    #[test]
    fn reads_camel_case_fields() {
        let config: Config = serde_json::from_str(
            r#"{
                "suiteDir": "/srv/suite",
                "useHttps": false,
                "timeoutMs": 5000,
                "expectsMode": "sequence",
                "devices": [{"name": "lab", "ipv4": "10.0.0.5"}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.suite_dir, PathBuf::from("/srv/suite"));
        assert!(!config.use_https);
        assert_eq!(config.expects_mode, ExpectsMode::Sequence);
        assert_eq!(config.devices[0].port, crate::device::DEFAULT_PORT);

        let options = config.session_options();
        assert_eq!(options.http.timeout_ms, Some(5000));
        assert!(!options.use_https);
    }
}
