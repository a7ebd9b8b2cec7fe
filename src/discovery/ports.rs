// TCP port probing
//
// Connect-only probes: a port counts as open when the TCP handshake
// completes within the timeout. Nothing is sent on the connection.

use super::COMMON_PORTS;
use crate::classify::classify_device;
use crate::device::{NetworkDevice, Port};
use std::net::{IpAddr, SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

/// Well-known service names by port
pub const KNOWN_SERVICES: &[(u16, &str)] = &[
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (445, "SMB"),
    (631, "IPP"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5432, "PostgreSQL"),
    (5900, "VNC"),
    (8080, "HTTP-Proxy"),
    (8443, "HTTPS-Alt"),
    (9100, "JetDirect"),
];

/// Service name for a port, empty when unknown
pub fn service_name(port: u16) -> &'static str {
    KNOWN_SERVICES
        .iter()
        .find(|(number, _)| *number == port)
        .map(|(_, name)| *name)
        .unwrap_or("")
}

/// Outcome of probing one host
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeReport {
    /// Open ports in ascending order
    pub open: Vec<Port>,
    /// Fastest successful connect in milliseconds
    pub fastest_ms: Option<f64>,
}

/// Probe one port; returns the connect time on success
fn probe_port(ip: IpAddr, port: u16, timeout: Duration) -> Option<Duration> {
    let addr = SocketAddr::new(ip, port);
    let started = Instant::now();
    match TcpStream::connect_timeout(&addr, timeout) {
        Ok(_stream) => Some(started.elapsed()),
        Err(_) => None,
    }
}

/// Probe a set of ports on one host concurrently
///
/// Each port gets its own scoped thread, so the whole probe takes about one
/// timeout regardless of how many ports are checked.
pub fn scan_ports(ip: IpAddr, ports: &[u16], timeout: Duration) -> ProbeReport {
    let results: Vec<(u16, Option<Duration>)> = thread::scope(|scope| {
        let handles: Vec<_> = ports
            .iter()
            .map(|&port| (port, scope.spawn(move || probe_port(ip, port, timeout))))
            .collect();

        handles
            .into_iter()
            .map(|(port, handle)| (port, handle.join().ok().flatten()))
            .collect()
    });

    let mut report = ProbeReport::default();
    for (port, elapsed) in results {
        let Some(elapsed) = elapsed else { continue };
        let ms = elapsed.as_secs_f64() * 1000.0;
        report.fastest_ms = Some(report.fastest_ms.map_or(ms, |best| best.min(ms)));
        report.open.push(Port::open_tcp(port, service_name(port)));
    }
    report.open.sort_by_key(|p| p.number);
    report.open.dedup_by_key(|p| p.number);

    tracing::debug!(%ip, probed = ports.len(), open = report.open.len(), "Port probe finished");
    report
}

/// Probe the common ports of a known device and reclassify it
///
/// Returns an updated copy: ports replaced by the probe result, class
/// re-guessed from the new evidence, latency updated when a port answered.
/// A device whose address does not parse is returned unchanged.
pub fn probe_device(device: &NetworkDevice, gateway_ip: &str, timeout: Duration) -> NetworkDevice {
    let Ok(ip) = device.ip.parse::<IpAddr>() else {
        tracing::warn!(ip = %device.ip, "Skipping port probe for unparseable address");
        return device.clone();
    };

    let report = scan_ports(ip, COMMON_PORTS, timeout);
    let mut updated = device.clone();
    updated.ports = report.open;
    if report.fastest_ms.is_some() {
        updated.response_time = report.fastest_ms.map(round_ms);
    }
    updated.device_type = classify_device(
        &updated.ip,
        gateway_ip,
        updated.vendor.as_deref(),
        updated.hostname.as_deref(),
        &updated.open_port_numbers(),
    );
    updated
}

/// Round milliseconds to two decimals for display
pub(crate) fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
