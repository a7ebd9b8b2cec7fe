// Remote feed client
//
// Connects to a scanning backend's WebSocket endpoint and forwards its
// messages. Blocking tungstenite on a dedicated thread: reads use a short
// timeout so queued commands and keepalives interleave with incoming
// frames. Lost connections are retried with exponential backoff.

use super::{
    backoff_delay, FeedCommand, FeedError, FeedEvent, FeedHandle, FeedMessage,
    MAX_RECONNECT_ATTEMPTS,
};
use crate::device::NetworkDevice;
use crate::discovery::ports::probe_device;
use std::io::{self, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tungstenite::client::IntoClientRequest;
use tungstenite::error::UrlError;
use tungstenite::handshake::HandshakeError;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// Read timeout; bounds command latency while connected or handshaking
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Write timeout for frames and the handshake request
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// TCP connect timeout per resolved address
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Time allowed for the server to answer the upgrade request
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between "ping" keepalives
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// How a connection ended without an error
#[derive(Debug, PartialEq, Eq)]
enum ConnectionEnd {
    /// Application asked to stop
    Shutdown,
    /// Server closed the socket
    Closed,
}

/// Start a client thread for `url`
///
/// # Arguments
/// * `url` - WebSocket endpoint, e.g. `ws://127.0.0.1:8000/ws`
/// * `port_timeout` - Connect timeout for port probes run from this host
pub fn spawn_ws_feed(url: String, port_timeout: Duration) -> FeedHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();
    let label = url.clone();

    let worker = thread::Builder::new()
        .name("feed-ws".to_string())
        .spawn(move || connection_loop(&url, port_timeout, &cmd_rx, &event_tx));

    let worker = match worker {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot spawn websocket client");
            None
        }
    };

    FeedHandle::new(cmd_tx, event_rx, worker, label)
}

/// Connect, serve, and reconnect until shut down or out of attempts
fn connection_loop(
    url: &str,
    port_timeout: Duration,
    commands: &Receiver<FeedCommand>,
    events: &Sender<FeedEvent>,
) {
    let mut attempts = 0u32;

    loop {
        match run_connection(url, port_timeout, commands, events, &mut attempts) {
            Ok(ConnectionEnd::Shutdown) => break,
            Ok(ConnectionEnd::Closed) => {
                tracing::info!(%url, "Backend closed the connection");
                attempts += 1;
                let _ = events.send(FeedEvent::Disconnected);
            }
            Err(e) => {
                tracing::warn!(error = %e, %url, "Websocket connection failed");
                attempts += 1;
                let _ = events.send(FeedEvent::Error(e.to_string()));
                let _ = events.send(FeedEvent::Disconnected);
            }
        }

        if attempts >= MAX_RECONNECT_ATTEMPTS {
            let msg = format!(
                "Websocket reconnection failed after {} attempts",
                MAX_RECONNECT_ATTEMPTS
            );
            tracing::warn!(%url, "{}", msg);
            let _ = events.send(FeedEvent::Error(msg));
            break;
        }

        let delay = backoff_delay(attempts);
        tracing::debug!(attempts, delay_secs = delay.as_secs(), "Waiting before reconnect");
        if wait_or_shutdown(commands, delay, events, port_timeout) {
            break;
        }
    }

    tracing::info!(%url, "Websocket client stopped");
}

/// Sleep for `delay` while watching for shutdown; true when asked to stop
///
/// Port probes run from this host and are served while disconnected; scan
/// and refresh requests need the backend and are dropped.
fn wait_or_shutdown(
    commands: &Receiver<FeedCommand>,
    delay: Duration,
    events: &Sender<FeedEvent>,
    port_timeout: Duration,
) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }
        match commands.recv_timeout(remaining) {
            Ok(FeedCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => return true,
            Ok(FeedCommand::ProbePorts { device, gateway_ip }) => {
                spawn_probe(device, gateway_ip, port_timeout, events.clone());
            }
            Ok(other) => tracing::debug!(command = ?other, "Dropping command while disconnected"),
            Err(RecvTimeoutError::Timeout) => return false,
        }
    }
}

/// Probe a device's ports on a short-lived thread and report the result
fn spawn_probe(
    device: NetworkDevice,
    gateway_ip: String,
    port_timeout: Duration,
    events: Sender<FeedEvent>,
) {
    thread::spawn(move || {
        let updated = probe_device(&device, &gateway_ip, port_timeout);
        let _ = events.send(FeedEvent::Message(FeedMessage::DeviceUpdated(updated)));
    });
}

/// Move queued commands into `backlog`; true when shutdown was requested
fn collect_commands(commands: &Receiver<FeedCommand>, backlog: &mut Vec<FeedCommand>) -> bool {
    loop {
        match commands.try_recv() {
            Ok(FeedCommand::Shutdown) | Err(TryRecvError::Disconnected) => return true,
            Ok(command) => backlog.push(command),
            Err(TryRecvError::Empty) => return false,
        }
    }
}

/// Open a TCP stream to the endpoint of `url` with bounded connect time
///
/// Read and write timeouts are set before any byte of the handshake is
/// exchanged, so a silent server cannot block the worker.
fn open_stream(url: &str) -> Result<TcpStream, tungstenite::Error> {
    let request = url.into_client_request()?;
    let uri = request.uri();
    let default_port = match uri.scheme_str() {
        Some("ws") => 80,
        Some("wss") => return Err(tungstenite::Error::Url(UrlError::TlsFeatureNotEnabled)),
        _ => return Err(tungstenite::Error::Url(UrlError::UnsupportedUrlScheme)),
    };
    let host = uri
        .host()
        .ok_or(tungstenite::Error::Url(UrlError::NoHostName))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = uri.port_u16().unwrap_or(default_port);

    let mut last_error =
        io::Error::new(ErrorKind::NotFound, format!("no address found for {}", host));
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => {
                stream.set_read_timeout(Some(READ_TIMEOUT))?;
                stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%addr, error = %e, "TCP connect failed");
                last_error = e;
            }
        }
    }
    Err(tungstenite::Error::Io(last_error))
}

/// Outcome of the opening handshake
enum Handshake {
    Ready(Box<Socket>),
    Shutdown,
}

/// Connect and perform the WebSocket upgrade
///
/// The upgrade is retried on every read timeout until `HANDSHAKE_TIMEOUT`;
/// meanwhile queued commands are moved into `backlog` and a shutdown
/// request ends the attempt.
fn handshake(
    url: &str,
    commands: &Receiver<FeedCommand>,
    backlog: &mut Vec<FeedCommand>,
) -> Result<Handshake, FeedError> {
    let connect_error = |e: tungstenite::Error| FeedError::Connect {
        url: url.to_string(),
        source: Box::new(e),
    };

    let stream = open_stream(url).map_err(connect_error)?;
    let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
    let mut attempt = tungstenite::client(url, MaybeTlsStream::Plain(stream));

    loop {
        match attempt {
            Ok((socket, _response)) => return Ok(Handshake::Ready(Box::new(socket))),
            Err(HandshakeError::Interrupted(mid)) => {
                if collect_commands(commands, backlog) {
                    return Ok(Handshake::Shutdown);
                }
                if Instant::now() >= deadline {
                    return Err(connect_error(tungstenite::Error::Io(io::Error::new(
                        ErrorKind::TimedOut,
                        "handshake timed out",
                    ))));
                }
                attempt = mid.handshake();
            }
            Err(HandshakeError::Failure(e)) if is_timeout(&e) => {
                if collect_commands(commands, backlog) {
                    return Ok(Handshake::Shutdown);
                }
                return Err(connect_error(e));
            }
            Err(HandshakeError::Failure(e)) => return Err(connect_error(e)),
        }
    }
}

fn is_timeout(e: &tungstenite::Error) -> bool {
    matches!(e, tungstenite::Error::Io(io) if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut))
}

/// Serve one connection until it ends
fn run_connection(
    url: &str,
    port_timeout: Duration,
    commands: &Receiver<FeedCommand>,
    events: &Sender<FeedEvent>,
    attempts: &mut u32,
) -> Result<ConnectionEnd, FeedError> {
    let mut backlog = Vec::new();
    let mut socket = match handshake(url, commands, &mut backlog)? {
        Handshake::Ready(socket) => *socket,
        Handshake::Shutdown => return Ok(ConnectionEnd::Shutdown),
    };

    tracing::info!(%url, "Connected to scanning backend");
    *attempts = 0;
    if events.send(FeedEvent::Connected).is_err() {
        return Ok(ConnectionEnd::Shutdown);
    }

    let mut last_ping = Instant::now();

    loop {
        // Queued commands first
        let stop = collect_commands(commands, &mut backlog);
        for command in backlog.drain(..) {
            match command {
                FeedCommand::Scan => socket.send(Message::text("scan"))?,
                FeedCommand::ProbePorts { device, gateway_ip } => {
                    spawn_probe(device, gateway_ip, port_timeout, events.clone());
                }
                FeedCommand::Refresh | FeedCommand::Shutdown => {}
            }
        }
        if stop {
            let _ = socket.close(None);
            let _ = socket.flush();
            return Ok(ConnectionEnd::Shutdown);
        }

        if last_ping.elapsed() >= KEEPALIVE_INTERVAL {
            socket.send(Message::text("ping"))?;
            last_ping = Instant::now();
        }

        match socket.read() {
            Ok(Message::Text(text)) => match FeedMessage::parse(text.as_str()) {
                Ok(Some(message)) => {
                    if events.send(FeedEvent::Message(message)).is_err() {
                        return Ok(ConnectionEnd::Shutdown);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed frame");
                    let _ = events.send(FeedEvent::Error(e.to_string()));
                }
            },
            Ok(Message::Close(_)) => return Ok(ConnectionEnd::Closed),
            Ok(_) => {}
            Err(e) if is_timeout(&e) => {}
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                return Ok(ConnectionEnd::Closed)
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests::sample_device;
    use crate::device::DeviceClass;
    use std::net::TcpListener;

    fn wait_for(handle: &FeedHandle, done: impl Fn(&FeedEvent) -> bool) -> Vec<FeedEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            for event in handle.drain() {
                let finished = done(&event);
                seen.push(event);
                if finished {
                    return seen;
                }
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("timed out, saw {:?}", seen);
    }

    /// One-connection backend: greets, answers "scan", then closes
    fn spawn_backend() -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut ws = tungstenite::accept(stream).unwrap();
            ws.send(Message::text(
                r#"{"type": "connected", "data": {"message": "Connected to Network Radar"}}"#,
            ))
            .unwrap();

            let mut received = Vec::new();
            loop {
                match ws.read() {
                    Ok(Message::Text(text)) => {
                        received.push(text.as_str().to_string());
                        if text.as_str() == "scan" {
                            let device = sample_device("a", "192.168.1.9", DeviceClass::Printer);
                            let frame = serde_json::to_string(&FeedMessage::DeviceFound(device)).unwrap();
                            ws.send(Message::text(r#"{"type": "scan_started", "data": {}}"#)).unwrap();
                            ws.send(Message::text(r#"{"type": "mystery", "data": {}}"#)).unwrap();
                            ws.send(Message::text(frame)).unwrap();
                            let _ = ws.close(None);
                        }
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
            received
        });

        (url, server)
    }

    #[test]
    fn test_receives_messages_and_sends_scan() {
        let (url, server) = spawn_backend();
        let mut handle = spawn_ws_feed(url, Duration::from_millis(50));

        // Queued before the handshake; served once connected
        handle.send(FeedCommand::Scan).unwrap();

        let events = wait_for(&handle, |e| {
            matches!(e, FeedEvent::Message(FeedMessage::DeviceFound(_)))
        });
        assert_eq!(events[0], FeedEvent::Connected);
        assert!(events.contains(&FeedEvent::Message(FeedMessage::ScanStarted {})));
        assert!(events.iter().any(|e| matches!(
            e,
            FeedEvent::Message(FeedMessage::Connected { .. })
        )));

        handle.shutdown();
        let received = server.join().unwrap();
        assert_eq!(received, vec!["scan".to_string()]);
    }

    #[test]
    fn test_refused_connection_reports_error_and_stops_on_shutdown() {
        // Bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let mut handle = spawn_ws_feed(format!("ws://127.0.0.1:{}/ws", port), Duration::from_millis(50));

        let events = wait_for(&handle, |e| *e == FeedEvent::Disconnected);
        assert!(events.iter().any(|e| matches!(e, FeedEvent::Error(msg) if msg.contains("cannot connect"))));

        // Shutdown interrupts the backoff wait
        let started = Instant::now();
        handle.shutdown();
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_wait_or_shutdown() {
        let (tx, rx) = mpsc::channel();
        let (event_tx, _event_rx) = mpsc::channel();
        let timeout = Duration::from_millis(50);
        assert!(!wait_or_shutdown(&rx, Duration::from_millis(10), &event_tx, timeout));

        tx.send(FeedCommand::Refresh).unwrap();
        tx.send(FeedCommand::Shutdown).unwrap();
        assert!(wait_or_shutdown(&rx, Duration::from_secs(5), &event_tx, timeout));

        drop(tx);
        assert!(wait_or_shutdown(&rx, Duration::from_secs(5), &event_tx, timeout));
    }

    #[test]
    fn test_probe_served_while_disconnected() {
        let (tx, rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let device = sample_device("lo", "127.0.0.1", DeviceClass::Computer);
        tx.send(FeedCommand::ProbePorts {
            device,
            gateway_ip: "192.168.1.1".to_string(),
        })
        .unwrap();

        assert!(!wait_or_shutdown(&rx, Duration::from_millis(50), &event_tx, Duration::from_millis(50)));
        match event_rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            FeedEvent::Message(FeedMessage::DeviceUpdated(updated)) => assert_eq!(updated.id, "lo"),
            other => panic!("expected a probe result, got {:?}", other),
        }
    }

    #[test]
    fn test_shutdown_with_silent_backend() {
        // Accepts TCP but never answers the upgrade request
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(3));
            drop(stream);
        });

        let mut handle = spawn_ws_feed(url, Duration::from_millis(50));
        thread::sleep(Duration::from_millis(300));

        let started = Instant::now();
        handle.shutdown();
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "shutdown blocked {:?}",
            started.elapsed()
        );
        assert!(!handle.drain().contains(&FeedEvent::Connected));
        server.join().unwrap();
    }

    #[test]
    fn test_silent_backend_times_out_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(HANDSHAKE_TIMEOUT + Duration::from_secs(1));
            drop(stream);
        });

        let (_tx, rx) = mpsc::channel();
        let mut backlog = Vec::new();
        let started = Instant::now();
        match handshake(&url, &rx, &mut backlog) {
            Err(FeedError::Connect { source, .. }) => {
                assert!(source.to_string().contains("timed out"), "{}", source)
            }
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("handshake should not complete"),
        }
        assert!(started.elapsed() < HANDSHAKE_TIMEOUT + Duration::from_secs(1));
        server.join().unwrap();
    }

    #[test]
    fn test_open_stream_rejects_unsupported_urls() {
        assert!(matches!(
            open_stream("wss://127.0.0.1:1/ws"),
            Err(tungstenite::Error::Url(UrlError::TlsFeatureNotEnabled))
        ));
        assert!(open_stream("http://127.0.0.1:1/ws").is_err());
    }
}
