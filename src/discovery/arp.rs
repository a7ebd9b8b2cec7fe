// Neighbor-table scanner
//
// Discovers devices on the local IPv4 network by nudging every host with a
// throwaway UDP datagram (which makes the kernel resolve its hardware
// address) and then reading the kernel's ARP cache from /proc/net/arp.
// Needs no raw sockets and no elevated privileges.

use super::network::{detect_local_network, LocalNetwork};
use super::oui::OuiResolver;
use super::ports::{round_ms, scan_ports};
use super::{DeviceSource, DiscoveryError, ScanSettings, QUICK_PORTS};
use crate::classify::classify_device;
use crate::device::{format_mac, DeviceStatus, NetworkDevice, ScanResult};
use chrono::Local;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::thread;
use std::time::Instant;

const ARP_TABLE: &str = "/proc/net/arp";

/// Discard service; datagrams to it are dropped without a reply
const PRIME_PORT: u16 = 9;

/// ATF_COM: entry is complete
const ATF_COM: u32 = 0x2;

/// One resolved entry of the kernel neighbor table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborEntry {
    pub ip: Ipv4Addr,
    /// Normalized "AA:BB:CC:DD:EE:FF"
    pub mac: String,
    pub interface: String,
}

/// Parse /proc/net/arp content
///
/// Incomplete entries and all-zero hardware addresses are skipped.
pub fn parse_arp_table(content: &str) -> Vec<NeighborEntry> {
    // IP address       HW type     Flags       HW address            Mask     Device
    // 192.168.1.1      0x1         0x2         aa:bb:cc:dd:ee:ff     *        eth0
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 6 {
                return None;
            }

            let ip: Ipv4Addr = parts[0].parse().ok()?;
            let flags = u32::from_str_radix(parts[2].trim_start_matches("0x"), 16).ok()?;
            if flags & ATF_COM == 0 {
                return None;
            }

            let mac = format_mac(parts[3]);
            if mac.len() != 17 || mac.chars().all(|c| c == '0' || c == ':') {
                return None;
            }

            Some(NeighborEntry {
                ip,
                mac,
                interface: parts[5].to_string(),
            })
        })
        .collect()
}

/// Send one empty datagram to every target so the kernel resolves them
fn prime_neighbor_table(targets: &[Ipv4Addr]) {
    let socket = match UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot open priming socket, reading neighbor table as is");
            return;
        }
    };

    let mut failures = 0usize;
    for target in targets {
        if socket.send_to(&[], (*target, PRIME_PORT)).is_err() {
            failures += 1;
        }
    }
    tracing::debug!(targets = targets.len(), failures, "Primed neighbor table");
}

/// First label of a resolved name; numeric answers and empty labels are dropped
fn short_hostname(name: &str) -> Option<String> {
    let name = name.trim().trim_end_matches('.');
    if name.parse::<IpAddr>().is_ok() {
        return None;
    }
    name.split('.')
        .next()
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}

/// Reverse DNS lookup of `ip`, shortened to its first label
fn resolve_hostname(ip: Ipv4Addr) -> Option<String> {
    match dns_lookup::lookup_addr(&IpAddr::V4(ip)) {
        Ok(name) => short_hostname(&name),
        Err(e) => {
            tracing::trace!(%ip, error = %e, "No reverse DNS entry");
            None
        }
    }
}

/// Scanner backed by the kernel neighbor table
pub struct ArpScanner {
    oui: OuiResolver,
    settings: ScanSettings,
}

impl ArpScanner {
    pub fn new(oui: OuiResolver, settings: ScanSettings) -> Self {
        Self { oui, settings }
    }

    fn read_neighbors(&self, network: &LocalNetwork) -> Result<Vec<NeighborEntry>, DiscoveryError> {
        let content = fs::read_to_string(ARP_TABLE).map_err(|source| DiscoveryError::TableRead {
            path: ARP_TABLE,
            source,
        })?;

        Ok(parse_arp_table(&content)
            .into_iter()
            .filter(|entry| entry.interface == network.interface && network.contains(entry.ip))
            .collect())
    }

    /// Turn neighbor entries into devices
    ///
    /// Every entry gets its own scoped thread for the quick port probe and
    /// the reverse lookup, so slow hosts do not serialize the scan.
    fn build_devices(&self, entries: &[NeighborEntry], gateway_ip: &str) -> Vec<NetworkDevice> {
        let now = Local::now().naive_local();
        let timeout = self.settings.port_timeout;
        let quick_probe = self.settings.quick_probe;
        let resolve = self.settings.resolve_hostnames;

        let lookups: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = entries
                .iter()
                .map(|entry| {
                    scope.spawn(move || {
                        let hostname = if resolve {
                            let ip = entry.ip;
                            Some(thread::spawn(move || resolve_hostname(ip)))
                        } else {
                            None
                        };
                        let report = quick_probe
                            .then(|| scan_ports(IpAddr::V4(entry.ip), QUICK_PORTS, timeout));
                        let hostname = hostname.and_then(|h| h.join().ok().flatten());
                        (report, hostname)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or((None, None)))
                .collect()
        });

        entries
            .iter()
            .zip(lookups)
            .map(|(entry, (report, hostname))| {
                let ip = entry.ip.to_string();
                let vendor = self.oui.resolve(&entry.mac).map(str::to_string);
                let (ports, response_time) = match report {
                    Some(report) => (report.open, report.fastest_ms.map(round_ms)),
                    None => (Vec::new(), None),
                };
                let open: Vec<u16> = ports.iter().map(|p| p.number).collect();
                let device_type =
                    classify_device(&ip, gateway_ip, vendor.as_deref(), hostname.as_deref(), &open);

                NetworkDevice {
                    id: entry.mac.replace(':', ""),
                    ip,
                    mac: entry.mac.clone(),
                    hostname,
                    vendor,
                    device_type,
                    status: DeviceStatus::Online,
                    last_seen: now,
                    first_seen: now,
                    ports,
                    response_time,
                }
            })
            .collect()
    }
}

impl DeviceSource for ArpScanner {
    fn name(&self) -> &'static str {
        "arp"
    }

    fn scan(&mut self) -> Result<ScanResult, DiscoveryError> {
        if !cfg!(target_os = "linux") {
            return Err(DiscoveryError::Unsupported);
        }

        let started = Instant::now();
        let network = detect_local_network()?;
        let gateway_ip = network.gateway.to_string();
        tracing::info!(
            interface = %network.interface,
            cidr = %network.cidr(),
            gateway = %gateway_ip,
            "Starting neighbor scan"
        );

        prime_neighbor_table(&network.prime_targets());
        thread::sleep(self.settings.settle_delay);

        let entries = self.read_neighbors(&network)?;
        let devices = self.build_devices(&entries, &gateway_ip);

        let scan_duration = started.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(devices = devices.len(), duration_ms = scan_duration, "Neighbor scan complete");

        Ok(ScanResult {
            timestamp: Local::now().naive_local(),
            network_cidr: network.cidr(),
            gateway_ip,
            devices,
            scan_duration: round_ms(scan_duration),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARP_SAMPLE: &str = "\
IP address       HW type     Flags       HW address            Mask     Device
192.168.1.1      0x1         0x2         b8:27:eb:aa:bb:cc     *        eth0
192.168.1.23     0x1         0x0         00:00:00:00:00:00     *        eth0
192.168.1.40     0x1         0x2         00:00:00:00:00:00     *        eth0
192.168.1.77     0x1         0x6         28:6f:b9:01:02:03     *        eth0
172.17.0.2       0x1         0x2         02:42:ac:11:00:02     *        docker0
garbage line
";

    #[test]
    fn test_parse_arp_table() {
        let entries = parse_arp_table(ARP_SAMPLE);
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].ip, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(entries[0].mac, "B8:27:EB:AA:BB:CC");
        assert_eq!(entries[0].interface, "eth0");

        assert_eq!(entries[1].ip, Ipv4Addr::new(192, 168, 1, 77));
        assert_eq!(entries[2].interface, "docker0");
    }

    #[test]
    fn test_incomplete_and_zero_entries_skipped() {
        let entries = parse_arp_table(ARP_SAMPLE);
        assert!(entries.iter().all(|e| e.ip != Ipv4Addr::new(192, 168, 1, 23)));
        assert!(entries.iter().all(|e| e.ip != Ipv4Addr::new(192, 168, 1, 40)));
    }

    #[test]
    fn test_build_devices_without_probe() {
        let oui = OuiResolver::parse("B8-27-EB   (hex)\t\tRaspberry Pi Foundation\n");
        let settings = ScanSettings {
            quick_probe: false,
            resolve_hostnames: false,
            ..ScanSettings::default()
        };
        let scanner = ArpScanner::new(oui, settings);

        let entries = parse_arp_table(ARP_SAMPLE);
        let devices = scanner.build_devices(&entries[..2], "192.168.1.1");
        assert_eq!(devices.len(), 2);

        let gateway = &devices[0];
        assert_eq!(gateway.id, "B827EBAABBCC");
        assert_eq!(gateway.vendor.as_deref(), Some("Raspberry Pi Foundation"));
        assert_eq!(gateway.device_type, crate::device::DeviceClass::Router);
        assert_eq!(gateway.status, DeviceStatus::Online);
        assert!(gateway.ports.is_empty());

        let other = &devices[1];
        assert_eq!(other.id, "286FB9010203");
        assert_eq!(other.vendor, None);
        assert_eq!(other.device_type, crate::device::DeviceClass::Unknown);
        assert_eq!(other.hostname, None);
    }

    #[test]
    fn test_short_hostname_keeps_first_label() {
        assert_eq!(short_hostname("nas.lan"), Some("nas".to_string()));
        assert_eq!(short_hostname("proxmox-01.home.example.com."), Some("proxmox-01".to_string()));
        assert_eq!(short_hostname("printer"), Some("printer".to_string()));
        assert_eq!(short_hostname("192.168.1.20"), None);
        assert_eq!(short_hostname(""), None);
        assert_eq!(short_hostname(".lan"), None);
    }

    #[test]
    fn test_localhost_resolves_to_a_short_name() {
        // Loopback nearly always has a reverse entry; tolerate hosts without one
        if let Some(name) = resolve_hostname(Ipv4Addr::LOCALHOST) {
            assert!(!name.is_empty());
            assert!(!name.contains('.'));
        }
    }
}
