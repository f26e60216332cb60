//! # Device Discovery
//!
//! Devices are sampled as immutable snapshots. A refresh replaces the whole
//! snapshot; nothing edits one in place.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Port TWAIN Local scanners listen on unless told otherwise.
pub const DEFAULT_PORT: u16 = 55555;

/// A scanner advertising itself on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub name: String,
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub ipv6: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Free-form advertisement text (the TXT record note).
    #[serde(default)]
    pub note: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl DeviceInfo {
    /// Preferred address: IPv4 when advertised, IPv6 otherwise.
    pub fn address(&self) -> Option<&str> {
        self.ipv4
            .as_deref()
            .filter(|ip| !ip.is_empty())
            .or_else(|| self.ipv6.as_deref().filter(|ip| !ip.is_empty()))
    }

    /// Parse a `name@host[:port]` device spec. IPv6 hosts go in brackets.
    pub fn from_spec(spec: &str) -> Result<Self, String> {
        let (name, target) = spec
            .split_once('@')
            .ok_or_else(|| format!("Invalid device `{spec}`, expected name@host[:port]"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("Device name is empty: `{spec}`"));
        }

        let (host, port) = split_host_port(target.trim())?;
        if host.is_empty() {
            return Err(format!("Device host is empty: `{spec}`"));
        }

        let (ipv4, ipv6) = if host.contains(':') {
            (None, Some(host.to_string()))
        } else {
            (Some(host.to_string()), None)
        };

        Ok(Self {
            name: name.to_string(),
            ipv4,
            ipv6,
            port: port.unwrap_or(DEFAULT_PORT),
            note: String::new(),
        })
    }

    /// Does `pattern` occur in the name, the IPv4 address or the note?
    pub fn matches(&self, pattern: &str) -> bool {
        self.name.contains(pattern)
            || self.ipv4.as_deref().is_some_and(|ip| !ip.is_empty() && ip.contains(pattern))
            || (!self.note.is_empty() && self.note.contains(pattern))
    }
}

fn split_host_port(target: &str) -> Result<(&str, Option<u16>), String> {
    if let Some(rest) = target.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| format!("Unterminated IPv6 host `{target}`"))?;
        return match tail.strip_prefix(':') {
            Some(port) => Ok((host, Some(parse_port(port)?))),
            None if tail.is_empty() => Ok((host, None)),
            None => Err(format!("Invalid device host `{target}`")),
        };
    }

    match target.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => Ok((host, Some(parse_port(port)?))),
        Some(_) => Ok((target, None)),
        None => Ok((target, None)),
    }
}

fn parse_port(port: &str) -> Result<u16, String> {
    port.trim()
        .parse()
        .map_err(|e| format!("Invalid port `{port}`: {e}"))
}

impl Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.address().unwrap_or(""), self.note)
    }
}

/// Source of device snapshots.
pub trait Discovery {
    fn snapshot(&self) -> Vec<DeviceInfo>;
}

/// Discovery over a fixed device list (configuration and `--device` flags).
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    devices: Vec<DeviceInfo>,
}

impl StaticDiscovery {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self { devices }
    }
}

impl Discovery for StaticDiscovery {
    fn snapshot(&self) -> Vec<DeviceInfo> {
        self.devices.clone()
    }
}

/// Select from a snapshot: no pattern takes the first device, otherwise
/// the first device whose name, IPv4 address or note contains the pattern.
pub fn select_device<'a>(snapshot: &'a [DeviceInfo], pattern: Option<&str>) -> Option<&'a DeviceInfo> {
    match pattern.filter(|p| !p.is_empty()) {
        None => snapshot.first(),
        Some(pattern) => snapshot.iter().find(|device| device.matches(pattern)),
    }
}
