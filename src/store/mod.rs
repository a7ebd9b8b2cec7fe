// Device store
//
// Current picture of the network, merged from scan results and feed
// messages. Devices are keyed by id; the first time an id is seen is never
// overwritten by later reports.

use crate::device::{DeviceStatus, NetworkDevice, ScanResult};
use crate::feed::FeedMessage;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Metadata of the most recent completed scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanInfo {
    pub timestamp: NaiveDateTime,
    pub network_cidr: String,
    pub gateway_ip: String,
    /// Milliseconds
    pub scan_duration: f64,
}

/// Per-status device counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub online: usize,
    pub offline: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.online + self.offline + self.unknown
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeviceStore {
    devices: BTreeMap<String, NetworkDevice>,
    last_scan: Option<ScanInfo>,
    scanning: bool,
    last_error: Option<String>,
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a device, keeping the known `first_seen`
    pub fn upsert(&mut self, mut device: NetworkDevice) {
        if let Some(existing) = self.devices.get(&device.id) {
            device.first_seen = existing.first_seen;
        }
        self.devices.insert(device.id.clone(), device);
    }

    /// Merge a completed scan
    ///
    /// Every reported device is upserted. Known devices the scan did not
    /// report are marked offline.
    pub fn apply_scan(&mut self, result: ScanResult) {
        let ScanResult {
            timestamp,
            network_cidr,
            gateway_ip,
            devices,
            scan_duration,
        } = result;

        let reported: Vec<String> = devices.iter().map(|d| d.id.clone()).collect();
        for device in devices {
            self.upsert(device);
        }

        let mut missing = 0usize;
        for (id, device) in self.devices.iter_mut() {
            if !reported.contains(id) && device.status != DeviceStatus::Offline {
                device.status = DeviceStatus::Offline;
                missing += 1;
            }
        }

        tracing::debug!(
            reported = reported.len(),
            missing,
            total = self.devices.len(),
            "Applied scan result"
        );

        self.last_scan = Some(ScanInfo {
            timestamp,
            network_cidr,
            gateway_ip,
            scan_duration,
        });
        self.scanning = false;
        self.last_error = None;
    }

    /// Replace the whole device set, keeping known `first_seen` values
    pub fn replace_all(&mut self, devices: Vec<NetworkDevice>) {
        let previous = std::mem::take(&mut self.devices);
        for mut device in devices {
            if let Some(old) = previous.get(&device.id) {
                device.first_seen = old.first_seen;
            }
            self.devices.insert(device.id.clone(), device);
        }
    }

    /// Apply one feed message
    pub fn apply_message(&mut self, message: FeedMessage) {
        match message {
            FeedMessage::Connected { message } => {
                tracing::info!(%message, "Feed connected");
            }
            FeedMessage::DevicesList { devices } => self.replace_all(devices),
            FeedMessage::DeviceFound(device) | FeedMessage::DeviceUpdated(device) => {
                self.upsert(device)
            }
            FeedMessage::ScanStarted {} => {
                self.scanning = true;
            }
            FeedMessage::ScanCompleted(result) => self.apply_scan(result),
            FeedMessage::ScanError { error } => {
                tracing::warn!(%error, "Scan reported an error");
                self.scanning = false;
                self.last_error = Some(error);
            }
            FeedMessage::Pong => {}
        }
    }

    /// Devices in id order
    pub fn devices(&self) -> impl Iterator<Item = &NetworkDevice> {
        self.devices.values()
    }

    pub fn get(&self, id: &str) -> Option<&NetworkDevice> {
        self.devices.get(id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn counts(&self) -> StatusCounts {
        self.devices
            .values()
            .fold(StatusCounts::default(), |mut counts, device| {
                match device.status {
                    DeviceStatus::Online => counts.online += 1,
                    DeviceStatus::Offline => counts.offline += 1,
                    DeviceStatus::Unknown => counts.unknown += 1,
                }
                counts
            })
    }

    pub fn last_scan(&self) -> Option<&ScanInfo> {
        self.last_scan.as_ref()
    }

    /// Gateway of the last scan, empty before the first one
    pub fn gateway_ip(&self) -> &str {
        self.last_scan
            .as_ref()
            .map(|s| s.gateway_ip.as_str())
            .unwrap_or("")
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Forget an in-flight scan whose result can no longer arrive
    pub fn cancel_scan(&mut self) {
        self.scanning = false;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}
