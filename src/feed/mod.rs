// Live device feed
//
// Everything the dashboard learns about the network arrives as a
// `FeedEvent` on a channel, whether it comes from a local scanner thread
// or from a remote scanning backend over WebSocket. Commands travel the
// other way on a second channel.

pub mod local;
pub mod ws;

pub use local::spawn_local_feed;
pub use ws::spawn_ws_feed;

use crate::device::{NetworkDevice, ScanResult};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

/// Message types understood by this client
const KNOWN_TYPES: &[&str] = &[
    "connected",
    "devices_list",
    "device_found",
    "device_updated",
    "scan_started",
    "scan_completed",
    "scan_error",
    "pong",
];

/// A message from the scanning backend
///
/// Wire form is `{"type": "<snake_case name>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FeedMessage {
    Connected { message: String },
    DevicesList { devices: Vec<NetworkDevice> },
    DeviceFound(NetworkDevice),
    DeviceUpdated(NetworkDevice),
    ScanStarted {},
    ScanCompleted(ScanResult),
    ScanError { error: String },
    Pong,
}

impl FeedMessage {
    /// Parse one text frame
    ///
    /// Returns `Ok(None)` for well-formed frames of a type this client does
    /// not know, so newer backends can add message types.
    pub fn parse(text: &str) -> Result<Option<Self>, FeedError> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(rename = "type")]
            kind: String,
        }

        let envelope: Envelope = serde_json::from_str(text).map_err(FeedError::Malformed)?;
        if !KNOWN_TYPES.contains(&envelope.kind.as_str()) {
            tracing::debug!(kind = %envelope.kind, "Ignoring unknown feed message type");
            return Ok(None);
        }
        serde_json::from_str(text)
            .map(Some)
            .map_err(FeedError::Malformed)
    }
}

/// Events delivered to the application
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Source is ready (local worker started or socket connected)
    Connected,
    /// Socket lost; a reconnect may follow
    Disconnected,
    Message(FeedMessage),
    /// Non-fatal problem worth showing to the user
    Error(String),
}

/// Requests sent to a feed worker
#[derive(Debug, Clone, PartialEq)]
pub enum FeedCommand {
    /// Start a full scan
    Scan,
    /// Periodic data tick
    Refresh,
    /// Probe the common ports of one device; the gateway keeps its router class
    ProbePorts {
        device: NetworkDevice,
        gateway_ip: String,
    },
    Shutdown,
}

/// Errors raised by feed workers
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("cannot connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },

    #[error("websocket error: {0}")]
    Socket(#[source] Box<tungstenite::Error>),

    #[error("malformed feed message: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("feed worker has stopped")]
    Closed,
}

impl From<tungstenite::Error> for FeedError {
    fn from(e: tungstenite::Error) -> Self {
        Self::Socket(Box::new(e))
    }
}

/// Maximum reconnection attempts before giving up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Base delay between reconnection attempts (exponential backoff)
pub const RECONNECT_BASE_DELAY_SECS: u64 = 2;

/// Maximum delay between reconnection attempts
pub const MAX_RECONNECT_DELAY_SECS: u64 = 60;

/// Exponential backoff delay for the given attempt number
pub fn backoff_delay(attempts: u32) -> Duration {
    let secs = RECONNECT_BASE_DELAY_SECS
        .saturating_mul(1 << attempts.min(6))
        .min(MAX_RECONNECT_DELAY_SECS);
    Duration::from_secs(secs)
}

/// Application side of a feed worker
pub struct FeedHandle {
    commands: Sender<FeedCommand>,
    events: Receiver<FeedEvent>,
    worker: Option<JoinHandle<()>>,
    label: String,
}

impl FeedHandle {
    pub(crate) fn new(
        commands: Sender<FeedCommand>,
        events: Receiver<FeedEvent>,
        worker: Option<JoinHandle<()>>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            commands,
            events,
            worker,
            label: label.into(),
        }
    }

    /// Human-readable source description ("mock", "ws://host/ws", ...)
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Queue a command for the worker
    pub fn send(&self, command: FeedCommand) -> Result<(), FeedError> {
        self.commands.send(command).map_err(|_| FeedError::Closed)
    }

    /// All events received since the last call, without blocking
    pub fn drain(&self) -> Vec<FeedEvent> {
        self.events.try_iter().collect()
    }

    /// Stop the worker and wait for it to exit
    pub fn shutdown(&mut self) {
        let _ = self.commands.send(FeedCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!(source = %self.label, "Feed worker panicked");
            }
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
