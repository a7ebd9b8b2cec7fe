// Local feed worker
//
// Runs a `DeviceSource` on its own thread so slow scans (neighbor-table
// settle time, port probes) never stall the UI loop. Speaks the same
// message vocabulary as the remote backend.

use super::{FeedCommand, FeedEvent, FeedHandle, FeedMessage};
use crate::discovery::ports::probe_device;
use crate::discovery::DeviceSource;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

/// Start a worker thread that owns `source`
///
/// # Arguments
/// * `source` - Device source to drive
/// * `port_timeout` - Connect timeout for on-demand port probes
pub fn spawn_local_feed(source: Box<dyn DeviceSource>, port_timeout: Duration) -> FeedHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();
    let label = source.name().to_string();

    let worker = thread::Builder::new()
        .name(format!("feed-{}", label))
        .spawn(move || run_worker(source, port_timeout, cmd_rx, event_tx));

    let worker = match worker {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot spawn feed worker");
            None
        }
    };

    FeedHandle::new(cmd_tx, event_rx, worker, label)
}

fn run_worker(
    mut source: Box<dyn DeviceSource>,
    port_timeout: Duration,
    commands: Receiver<FeedCommand>,
    events: Sender<FeedEvent>,
) {
    tracing::info!(source = source.name(), "Local feed started");
    if events.send(FeedEvent::Connected).is_err() {
        return;
    }

    for command in commands.iter() {
        let outgoing = match command {
            FeedCommand::Shutdown => break,
            FeedCommand::Scan => run_scan(source.as_mut(), &events),
            FeedCommand::Refresh => match source.refresh() {
                Ok(Some(devices)) => vec![FeedMessage::DevicesList { devices }],
                Ok(None) => Vec::new(),
                Err(e) => {
                    tracing::warn!(error = %e, "Refresh failed");
                    vec![FeedMessage::ScanError {
                        error: e.to_string(),
                    }]
                }
            },
            FeedCommand::ProbePorts { device, gateway_ip } => {
                let updated = probe_device(&device, &gateway_ip, port_timeout);
                vec![FeedMessage::DeviceUpdated(updated)]
            }
        };

        for message in outgoing {
            if events.send(FeedEvent::Message(message)).is_err() {
                tracing::debug!("Feed receiver dropped, stopping worker");
                return;
            }
        }
    }

    tracing::info!(source = source.name(), "Local feed stopped");
}

/// Run one full scan; `ScanStarted` is sent before the scan begins
fn run_scan(source: &mut dyn DeviceSource, events: &Sender<FeedEvent>) -> Vec<FeedMessage> {
    let _ = events.send(FeedEvent::Message(FeedMessage::ScanStarted {}));

    match source.scan() {
        Ok(result) => vec![FeedMessage::ScanCompleted(result)],
        Err(e) => {
            tracing::warn!(error = %e, source = source.name(), "Scan failed");
            vec![FeedMessage::ScanError {
                error: e.to_string(),
            }]
        }
    }
}
