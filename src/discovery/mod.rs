// Device discovery
//
// Sources that produce scan results for the dashboard: a synthetic mock
// network and a local scanner built on the kernel neighbor table.
// Read-only with respect to the host: nothing here changes system state.

pub mod arp;
pub mod mock;
pub mod network;
pub mod oui;
pub mod ports;

pub use arp::ArpScanner;
pub use mock::MockNetwork;
pub use network::{detect_local_network, LocalNetwork};
pub use oui::OuiResolver;

use crate::device::{NetworkDevice, ScanResult};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Ports probed when a device's ports are scanned on demand
pub const COMMON_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 143, 443, 445, 993, 995, 3306, 3389, 5432, 5900, 8080, 8443,
];

/// Ports probed for every device during a scan
pub const QUICK_PORTS: &[u16] = &[22, 80, 443, 445, 3389, 8080];

/// Errors raised while discovering devices
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A kernel table under /proc could not be read
    #[error("cannot read {path}: {source} (permission or OS issue)")]
    TableRead {
        path: &'static str,
        #[source]
        source: io::Error,
    },

    /// No IPv4 interface other than loopback / link-local was found
    #[error("no usable IPv4 interface found")]
    NoInterface,

    /// The OUI vendor database exists but could not be read
    #[error("cannot load OUI database {}: {source}", path.display())]
    OuiDatabase {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The neighbor table is not available on this platform
    #[error("neighbor table scanning is only supported on Linux")]
    Unsupported,
}

/// Tunables for local scanning
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Connect timeout for a single port probe
    pub port_timeout: Duration,

    /// Probe `QUICK_PORTS` on every device found by a scan
    pub quick_probe: bool,

    /// Reverse-resolve hostnames of devices found by a scan
    pub resolve_hostnames: bool,

    /// Delay between priming the neighbor table and reading it back
    pub settle_delay: Duration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            port_timeout: Duration::from_secs(1),
            quick_probe: true,
            resolve_hostnames: true,
            settle_delay: Duration::from_millis(500),
        }
    }
}

/// A producer of scan results
///
/// `scan` performs a full discovery pass. `refresh` is called on every data
/// tick and may return the current device list when it drifted since the
/// last call; it defaults to reporting nothing.
pub trait DeviceSource: Send {
    /// Short name for logs and the status bar
    fn name(&self) -> &'static str;

    /// Run a full discovery pass
    fn scan(&mut self) -> Result<ScanResult, DiscoveryError>;

    /// Cheap periodic update between full scans
    fn refresh(&mut self) -> Result<Option<Vec<NetworkDevice>>, DiscoveryError> {
        Ok(None)
    }
}
