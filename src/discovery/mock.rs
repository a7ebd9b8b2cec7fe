// Synthetic network
//
// Generates a plausible home network for demos and offline development:
// a router at .1 and a handful of hosts at .100 and up, with vendors,
// hostnames and open ports that fit each device class. Between scans the
// devices drift: a few change status and latencies wander.

use super::{DeviceSource, DiscoveryError};
use crate::device::{DeviceClass, DeviceStatus, NetworkDevice, Port, ScanResult};
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::thread;
use std::time::Duration;

const MOCK_CIDR: &str = "192.168.1.0/24";
const MOCK_GATEWAY: &str = "192.168.1.1";

const VENDORS: &[&str] = &[
    "Apple, Inc.",
    "Samsung Electronics",
    "Intel Corporate",
    "Raspberry Pi Foundation",
    "TP-Link Technologies",
    "Cisco Systems",
    "Dell Inc.",
    "Hewlett Packard",
    "ASUS Computer",
    "Google, Inc.",
    "Amazon Technologies",
    "Xiaomi Communications",
];

const HOSTNAMES: &[&str] = &[
    "macbook-pro",
    "galaxy-s23",
    "raspberrypi",
    "desktop-pc",
    "smart-tv",
    "printer-office",
    "nest-hub",
    "echo-dot",
    "iphone-14",
    "surface-laptop",
    "synology-nas",
    "gaming-pc",
];

const HOST_CLASSES: &[DeviceClass] = &[
    DeviceClass::Router,
    DeviceClass::Computer,
    DeviceClass::Mobile,
    DeviceClass::Server,
    DeviceClass::Iot,
    DeviceClass::Printer,
];

/// Online is three times as likely as offline or unknown
const STATUS_WEIGHTS: &[DeviceStatus] = &[
    DeviceStatus::Online,
    DeviceStatus::Online,
    DeviceStatus::Online,
    DeviceStatus::Offline,
    DeviceStatus::Unknown,
];

/// Chance that a device changes status between two refreshes
const STATUS_CHANGE_CHANCE: f64 = 0.10;

const MIN_DEVICES: usize = 8;
const MAX_DEVICES: usize = 12;

/// Open ports typical for a device class
fn ports_for(class: DeviceClass) -> Vec<Port> {
    let table: &[(u16, &str)] = match class {
        DeviceClass::Router => &[(80, "HTTP"), (443, "HTTPS"), (53, "DNS")],
        DeviceClass::Server => &[(22, "SSH"), (80, "HTTP"), (443, "HTTPS"), (3306, "MySQL")],
        DeviceClass::Computer => &[(22, "SSH"), (445, "SMB")],
        DeviceClass::Printer => &[(9100, "JetDirect"), (631, "IPP")],
        DeviceClass::Iot => &[(80, "HTTP")],
        DeviceClass::Mobile | DeviceClass::Unknown => &[],
    };
    table
        .iter()
        .map(|(number, service)| Port::open_tcp(*number, *service))
        .collect()
}

fn random_mac(rng: &mut impl Rng) -> String {
    const HEX: &[u8] = b"0123456789ABCDEF";
    (0..12)
        .map(|_| char::from(HEX[rng.gen_range(0..HEX.len())]))
        .collect()
}

fn random_status(rng: &mut impl Rng) -> DeviceStatus {
    STATUS_WEIGHTS
        .choose(rng)
        .copied()
        .unwrap_or(DeviceStatus::Unknown)
}

fn random_latency(rng: &mut impl Rng) -> f64 {
    f64::from(rng.gen_range(1u32..=50))
}

/// Create the synthetic device at `index`; index 0 is always the router
fn mock_device(index: usize, now: NaiveDateTime, rng: &mut impl Rng) -> NetworkDevice {
    let class = if index == 0 {
        DeviceClass::Router
    } else {
        HOST_CLASSES
            .choose(rng)
            .copied()
            .unwrap_or(DeviceClass::Unknown)
    };
    let ip = if index == 0 {
        MOCK_GATEWAY.to_string()
    } else {
        format!("192.168.1.{}", 100 + index)
    };
    let age_secs = rng.gen_range(0..30 * 24 * 3600);

    NetworkDevice {
        id: format!("device-{}", index),
        ip,
        mac: random_mac(rng),
        hostname: Some(HOSTNAMES[index % HOSTNAMES.len()].to_string()),
        vendor: VENDORS.choose(rng).map(|v| v.to_string()),
        device_type: class,
        status: random_status(rng),
        last_seen: now,
        first_seen: now - ChronoDuration::seconds(age_secs),
        ports: ports_for(class),
        response_time: Some(random_latency(rng)),
    }
}

/// Drift a device list between scans
///
/// Each device changes to a random status with a 10% chance, gets a fresh
/// latency, and online devices have `last_seen` bumped to `now`.
pub fn jitter(devices: &mut [NetworkDevice], now: NaiveDateTime, rng: &mut impl Rng) {
    for device in devices.iter_mut() {
        let was_online = device.status == DeviceStatus::Online;
        if rng.gen_bool(STATUS_CHANGE_CHANCE) {
            device.status = random_status(rng);
        }
        device.response_time = Some(random_latency(rng));
        if was_online {
            device.last_seen = now;
        }
    }
}

/// In-memory synthetic device source
pub struct MockNetwork {
    rng: StdRng,
    devices: Vec<NetworkDevice>,
    scan_delay: Duration,
}

impl MockNetwork {
    /// Randomly seeded network that pauses `scan_delay` per full scan
    pub fn new(scan_delay: Duration) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            devices: Vec::new(),
            scan_delay,
        }
    }

    /// Reproducible network with no scan delay
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            devices: Vec::new(),
            scan_delay: Duration::ZERO,
        }
    }

    fn result(&mut self, now: NaiveDateTime) -> ScanResult {
        ScanResult {
            timestamp: now,
            network_cidr: MOCK_CIDR.to_string(),
            gateway_ip: MOCK_GATEWAY.to_string(),
            devices: self.devices.clone(),
            scan_duration: f64::from(self.rng.gen_range(500u32..2500)),
        }
    }
}

impl DeviceSource for MockNetwork {
    fn name(&self) -> &'static str {
        "mock"
    }

    /// Generate a fresh network of 8 to 12 devices
    fn scan(&mut self) -> Result<ScanResult, DiscoveryError> {
        if !self.scan_delay.is_zero() {
            thread::sleep(self.scan_delay);
        }

        let now = Local::now().naive_local();
        let count = self.rng.gen_range(MIN_DEVICES..=MAX_DEVICES);
        let rng = &mut self.rng;
        self.devices = (0..count).map(|i| mock_device(i, now, rng)).collect();

        tracing::debug!(devices = count, "Generated mock network");
        Ok(self.result(now))
    }

    /// Drift the current devices; nothing to report before the first scan
    fn refresh(&mut self) -> Result<Option<Vec<NetworkDevice>>, DiscoveryError> {
        if self.devices.is_empty() {
            return Ok(None);
        }
        let now = Local::now().naive_local();
        jitter(&mut self.devices, now, &mut self.rng);
        Ok(Some(self.devices.clone()))
    }
}
