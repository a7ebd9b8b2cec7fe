// Device data model
//
// Types shared by discovery, the live feed, the device store and the UI.
// Field names and string encodings match the scanning backend's JSON so
// records can be deserialized straight off the wire.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Reachability status of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceStatus {
    Online,
    Offline,
    #[default]
    Unknown,
}

impl DeviceStatus {
    /// All statuses in display order
    pub const ALL: [DeviceStatus; 3] = [Self::Online, Self::Offline, Self::Unknown];

    /// Parse a status label, falling back to `Unknown` for anything unrecognized
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "online" => Self::Online,
            "offline" => Self::Offline,
            _ => Self::Unknown,
        }
    }

    /// Wire label ("online", "offline", "unknown")
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeviceStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Inferred role of a network device
///
/// The class selects the radial zone a device is drawn in on the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceClass {
    Router,
    Server,
    Computer,
    Printer,
    Mobile,
    Iot,
    #[default]
    Unknown,
}

impl DeviceClass {
    /// All classes, innermost radar zone first
    pub const ALL: [DeviceClass; 7] = [
        Self::Router,
        Self::Server,
        Self::Computer,
        Self::Printer,
        Self::Unknown,
        Self::Mobile,
        Self::Iot,
    ];

    /// Parse a class label, falling back to `Unknown` for anything unrecognized
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "router" => Self::Router,
            "server" => Self::Server,
            "computer" => Self::Computer,
            "printer" => Self::Printer,
            "mobile" => Self::Mobile,
            "iot" => Self::Iot,
            _ => Self::Unknown,
        }
    }

    /// Wire label ("router", "iot", ...)
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Server => "server",
            Self::Computer => "computer",
            Self::Printer => "printer",
            Self::Mobile => "mobile",
            Self::Iot => "iot",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable label for the list and inspector
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Router => "Router",
            Self::Server => "Server",
            Self::Computer => "Computer",
            Self::Printer => "Printer",
            Self::Mobile => "Mobile Device",
            Self::Iot => "IoT Device",
            Self::Unknown => "Unknown",
        }
    }

    /// Single-cell glyph drawn on the radar
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Router => "◆",
            Self::Server => "■",
            Self::Computer => "▣",
            Self::Printer => "▤",
            Self::Mobile => "▲",
            Self::Iot => "●",
            Self::Unknown => "?",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeviceClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Transport of a probed port; protocols other than TCP and UDP become `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortProtocol {
    #[default]
    Tcp,
    Udp,
    Other,
}

impl PortProtocol {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "tcp" => Self::Tcp,
            "udp" => Self::Udp,
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Other => "other",
        }
    }
}

impl Serialize for PortProtocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PortProtocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Probe outcome of a port; unrecognized states become `Unknown`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortState {
    #[default]
    Open,
    Closed,
    Filtered,
    Unknown,
}

impl PortState {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "open" => Self::Open,
            "closed" => Self::Closed,
            "filtered" => Self::Filtered,
            _ => Self::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Filtered => "filtered",
            Self::Unknown => "unknown",
        }
    }
}

impl Serialize for PortState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PortState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// A probed port on a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub number: u16,
    #[serde(default)]
    pub protocol: PortProtocol,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub state: PortState,
}

impl Port {
    /// An open TCP port with the given service name
    pub fn open_tcp(number: u16, service: impl Into<String>) -> Self {
        Self {
            number,
            protocol: PortProtocol::Tcp,
            service: service.into(),
            state: PortState::Open,
        }
    }

    /// Format as "443/tcp HTTPS"
    pub fn format_display(&self) -> String {
        let proto = self.protocol.as_str();
        if self.service.is_empty() {
            format!("{}/{}", self.number, proto)
        } else {
            format!("{}/{} {}", self.number, proto, self.service)
        }
    }
}

/// A discovered device as reported by a scan or the live feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDevice {
    /// Stable identity (hardware address without separators for ARP scans)
    pub id: String,
    pub ip: String,
    pub mac: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub device_type: DeviceClass,
    #[serde(default)]
    pub status: DeviceStatus,
    pub last_seen: NaiveDateTime,
    pub first_seen: NaiveDateTime,
    #[serde(default)]
    pub ports: Vec<Port>,
    /// Round-trip estimate in milliseconds
    #[serde(default)]
    pub response_time: Option<f64>,
}

impl NetworkDevice {
    /// Last IPv4 octet, used for numeric IP ordering
    pub fn last_octet(&self) -> Option<u8> {
        self.ip.rsplit('.').next().and_then(|o| o.parse().ok())
    }

    /// Hostname if known, otherwise the IP address
    pub fn display_name(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.ip)
    }

    pub fn open_port_numbers(&self) -> Vec<u16> {
        self.ports
            .iter()
            .filter(|p| p.state == PortState::Open)
            .map(|p| p.number)
            .collect()
    }
}

/// Result of one complete scan pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub timestamp: NaiveDateTime,
    pub network_cidr: String,
    pub gateway_ip: String,
    pub devices: Vec<NetworkDevice>,
    /// Scan duration in milliseconds
    pub scan_duration: f64,
}

/// Normalize a hardware address to "AA:BB:CC:DD:EE:FF"
///
/// Existing separators (':' or '-') are dropped before regrouping, so both
/// "aabbccddeeff" and "aa-bb-cc-dd-ee-ff" produce the same output.
pub fn format_mac(mac: &str) -> String {
    let clean: Vec<char> = mac
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    clean
        .chunks(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(":")
}

/// Relative "last seen" label ("now", "5m ago", "3h ago", "2d ago")
pub fn last_seen_label(last_seen: NaiveDateTime, now: NaiveDateTime) -> String {
    let minutes = (now - last_seen).num_minutes();
    if minutes < 1 {
        return "now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}
