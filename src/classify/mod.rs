// Device classification
//
// Guesses a device's role from its vendor string, hostname and open ports.
// Rules are checked in order and the first match wins.

use crate::device::DeviceClass;

const ROUTER_VENDORS: &[&str] = &[
    "cisco", "netgear", "tp-link", "tplink", "asus", "d-link", "linksys", "ubiquiti", "mikrotik",
    "huawei",
];

const MOBILE_VENDORS: &[&str] = &[
    "apple",
    "samsung",
    "xiaomi",
    "huawei",
    "oneplus",
    "google",
    "motorola",
    "lg electronics",
];

const PRINTER_VENDORS: &[&str] = &["hp", "epson", "canon", "brother", "lexmark", "xerox"];

const IOT_VENDORS: &[&str] = &[
    "amazon",
    "sonos",
    "ring",
    "nest",
    "philips hue",
    "espressif",
    "tuya",
    "shelly",
];

const SERVER_HOSTNAMES: &[&str] = &["server", "nas", "storage", "proxmox", "esxi"];

/// Ports a phone normally keeps closed
const NON_MOBILE_PORTS: &[u16] = &[22, 80, 443, 445];

/// Desktop sharing / file sharing ports
const COMPUTER_PORTS: &[u16] = &[445, 3389, 5900];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn any_open(open_ports: &[u16], candidates: &[u16]) -> bool {
    candidates.iter().any(|p| open_ports.contains(p))
}

/// Guess the class of a device
///
/// # Arguments
/// * `vendor` - OUI vendor name if resolved
/// * `hostname` - Reverse-resolved or reported hostname
/// * `open_ports` - Open TCP port numbers from a probe
pub fn guess_device_type(
    vendor: Option<&str>,
    hostname: Option<&str>,
    open_ports: &[u16],
) -> DeviceClass {
    let vendor_lower = vendor.unwrap_or_default().to_lowercase();
    let hostname_lower = hostname.unwrap_or_default().to_lowercase();

    if contains_any(&vendor_lower, ROUTER_VENDORS) && any_open(open_ports, &[80, 443]) {
        return DeviceClass::Router;
    }

    if contains_any(&vendor_lower, MOBILE_VENDORS) && !any_open(open_ports, NON_MOBILE_PORTS) {
        return DeviceClass::Mobile;
    }

    if contains_any(&vendor_lower, PRINTER_VENDORS) {
        return DeviceClass::Printer;
    }

    if contains_any(&vendor_lower, IOT_VENDORS) {
        return DeviceClass::Iot;
    }

    if contains_any(&hostname_lower, SERVER_HOSTNAMES) {
        return DeviceClass::Server;
    }

    if open_ports.contains(&22) && open_ports.contains(&3306) {
        return DeviceClass::Server;
    }

    if any_open(open_ports, COMPUTER_PORTS) {
        return DeviceClass::Computer;
    }

    if vendor.is_some() {
        return DeviceClass::Computer;
    }

    DeviceClass::Unknown
}

/// Classify a device, forcing the gateway to `Router`
pub fn classify_device(
    ip: &str,
    gateway_ip: &str,
    vendor: Option<&str>,
    hostname: Option<&str>,
    open_ports: &[u16],
) -> DeviceClass {
    if ip == gateway_ip {
        return DeviceClass::Router;
    }
    guess_device_type(vendor, hostname, open_ports)
}
