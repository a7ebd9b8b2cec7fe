// Application state management
//
// This module contains the main AppState struct and re-exports
// configuration types from the config submodule.

pub mod config;
pub mod event;
pub mod filter;

// Re-export config types for convenience
pub use config::{RadarSettings, RefreshConfig, CHANGE_HIGHLIGHT_DURATION};
pub use filter::{ListView, SortDirection, SortField, StatusFilter};

use crate::device::{DeviceStatus, NetworkDevice};
use crate::feed::{FeedCommand, FeedEvent, FeedHandle, FeedMessage};
use crate::store::DeviceStore;
use config::{PULSE_STEP, SWEEP_STEP, TICK_INTERVAL_MS};
use ratatui::widgets::ListState;
use std::time::Instant;

/// Connection state of the device feed, shown in the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// Waiting for the worker or socket to come up
    Connecting,
    Connected,
    /// Socket lost; the worker is retrying
    Disconnected,
}

impl FeedState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Main application state
pub struct AppState {
    /// Whether the application is running
    pub running: bool,

    /// Everything known about the network
    pub store: DeviceStore,

    /// Worker producing device events
    feed: FeedHandle,

    /// Connection state of the feed
    pub feed_state: FeedState,

    /// Search, status filter and sort order of the device list
    pub list_view: ListView,

    /// Whether keystrokes currently edit the search query
    pub search_active: bool,

    /// Id of the selected device; survives re-sorting and filtering
    pub selected_id: Option<String>,

    /// List state for the device list (enables scrolling)
    pub device_list_state: ListState,

    /// Device whose port probe is in flight
    pub pending_probe: Option<String>,

    /// Radar visual settings (labels, sweep, offline devices)
    pub radar_settings: RadarSettings,

    /// Pulse phase for online markers (0.0 ~ 1.0)
    pub pulse_phase: f32,

    /// Sweep arm phase (0.0 ~ 1.0, one revolution)
    pub sweep_phase: f32,

    /// Last tick time for animations
    pub last_tick: Instant,

    /// Refresh interval configuration
    pub refresh_config: RefreshConfig,

    /// Last time a data refresh was requested
    last_data_tick: Instant,

    /// Last time a full scan was requested
    last_scan_request: Instant,

    /// Whether full scans repeat on their own (sources without push updates)
    auto_rescan: bool,
}

impl AppState {
    /// Create the application state around a running feed
    ///
    /// An initial scan is requested immediately.
    ///
    /// # Arguments
    /// * `feed` - Handle of the worker producing device events
    /// * `refresh_config` - UI and data refresh intervals
    /// * `auto_rescan` - Repeat full scans every rescan interval
    pub fn new(feed: FeedHandle, refresh_config: RefreshConfig, auto_rescan: bool) -> Self {
        let now = Instant::now();
        let mut state = Self {
            running: true,
            store: DeviceStore::new(),
            feed,
            feed_state: FeedState::Connecting,
            list_view: ListView::default(),
            search_active: false,
            selected_id: None,
            device_list_state: ListState::default(),
            pending_probe: None,
            radar_settings: RadarSettings::default(),
            pulse_phase: 0.0,
            sweep_phase: 0.0,
            last_tick: now,
            refresh_config,
            last_data_tick: now,
            last_scan_request: now,
            auto_rescan,
        };

        state.start_scan();
        state
    }

    /// Human-readable feed source ("mock", "arp", or the backend URL)
    pub fn source_label(&self) -> &str {
        self.feed.label()
    }

    /// Update state on each loop iteration
    ///
    /// Applies pending feed events, advances animations every tick, and
    /// schedules data refreshes and automatic rescans.
    pub fn on_tick(&mut self) {
        let now = Instant::now();

        self.process_feed_events();

        let elapsed_tick = now.duration_since(self.last_tick).as_millis();
        if elapsed_tick >= TICK_INTERVAL_MS {
            self.last_tick = now;

            self.pulse_phase += PULSE_STEP;
            if self.pulse_phase >= 1.0 {
                self.pulse_phase = 0.0;
            }

            if self.radar_settings.sweep_enabled {
                self.sweep_phase = (self.sweep_phase + SWEEP_STEP).rem_euclid(1.0);
            }
        }

        if now.duration_since(self.last_data_tick) >= self.refresh_config.data_interval() {
            self.last_data_tick = now;
            self.send(FeedCommand::Refresh);
        }

        if self.auto_rescan
            && now.duration_since(self.last_scan_request) >= self.refresh_config.rescan_interval()
        {
            tracing::debug!("Scheduled rescan");
            self.start_scan();
        }
    }

    /// Apply every event the feed produced since the last call
    pub fn process_feed_events(&mut self) {
        for event in self.feed.drain() {
            self.apply_event(event);
        }
        self.sync_selection();
    }

    fn apply_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Connected => {
                self.feed_state = FeedState::Connected;
                self.store.clear_error();
            }
            FeedEvent::Disconnected => {
                self.feed_state = FeedState::Disconnected;
                // A scan running on the backend can no longer report back
                self.store.cancel_scan();
                self.pending_probe = None;
            }
            FeedEvent::Message(message) => {
                if let FeedMessage::DeviceUpdated(device) = &message {
                    if self.pending_probe.as_deref() == Some(device.id.as_str()) {
                        self.pending_probe = None;
                    }
                }
                self.store.apply_message(message);
            }
            FeedEvent::Error(error) => self.store.set_error(error),
        }
    }

    /// Queue a command for the feed; false when the worker is gone
    fn send(&mut self, command: FeedCommand) -> bool {
        match self.feed.send(command) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot reach feed worker");
                self.store.set_error(e.to_string());
                false
            }
        }
    }

    /// Ask the feed for a full scan; ignored while one is running
    pub fn start_scan(&mut self) {
        self.last_scan_request = Instant::now();
        if self.store.is_scanning() {
            return;
        }
        self.send(FeedCommand::Scan);
    }

    /// Probe the common ports of the selected device
    pub fn probe_selected(&mut self) {
        let Some(device) = self.selected_device().cloned() else {
            return;
        };
        tracing::info!(ip = %device.ip, "Probing ports");
        let gateway_ip = self.store.gateway_ip().to_string();
        let id = device.id.clone();
        if self.send(FeedCommand::ProbePorts { device, gateway_ip }) {
            self.pending_probe = Some(id);
        }
    }

    /// Rows of the device list in display order
    pub fn visible_devices(&self) -> Vec<&NetworkDevice> {
        self.list_view.apply(self.store.devices())
    }

    /// Devices drawn on the radar; the list's search and filter do not apply
    pub fn radar_devices(&self) -> Vec<&NetworkDevice> {
        self.store
            .devices()
            .filter(|d| self.radar_settings.show_offline || d.status != DeviceStatus::Offline)
            .collect()
    }

    /// The selected device, if it is still known
    pub fn selected_device(&self) -> Option<&NetworkDevice> {
        self.selected_id.as_deref().and_then(|id| self.store.get(id))
    }

    /// Point the list state at the selected device's current row
    ///
    /// A selection hidden by the filter keeps its id but has no row.
    pub fn sync_selection(&mut self) {
        if let Some(id) = self.selected_id.as_deref() {
            if self.store.get(id).is_none() {
                self.selected_id = None;
            }
        }
        let row = self.selected_id.as_deref().and_then(|id| {
            self.visible_devices()
                .iter()
                .position(|d| d.id == id)
        });
        self.device_list_state.select(row);
    }

    fn select_row(&mut self, row: Option<usize>) {
        let id = row.and_then(|idx| self.visible_devices().get(idx).map(|d| d.id.clone()));
        let row = if id.is_some() {
            self.selected_id = id;
            row
        } else {
            None
        };
        self.device_list_state.select(row);
    }

    /// Move device selection up (decrease index)
    pub fn select_previous_device(&mut self) {
        let len = self.visible_devices().len();
        if len == 0 {
            self.device_list_state.select(None);
            return;
        }

        let next = match self.device_list_state.selected() {
            // Start at the last device
            None => len - 1,
            Some(idx) => idx.saturating_sub(1).min(len - 1),
        };
        self.select_row(Some(next));
    }

    /// Move device selection down (increase index)
    pub fn select_next_device(&mut self) {
        let len = self.visible_devices().len();
        if len == 0 {
            self.device_list_state.select(None);
            return;
        }

        let next = match self.device_list_state.selected() {
            // Start at the first device
            None => 0,
            Some(idx) => (idx + 1).min(len - 1),
        };
        self.select_row(Some(next));
    }

    /// Start editing the search query
    pub fn begin_search(&mut self) {
        self.search_active = true;
    }

    /// Stop editing; `keep` false also clears the query
    pub fn end_search(&mut self, keep: bool) {
        self.search_active = false;
        if !keep {
            self.list_view.search.clear();
        }
        self.sync_selection();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.list_view.search.push(c);
        self.sync_selection();
    }

    pub fn pop_search_char(&mut self) {
        self.list_view.search.pop();
        self.sync_selection();
    }

    pub fn cycle_status_filter(&mut self) {
        self.list_view.cycle_status_filter();
        self.sync_selection();
    }

    pub fn toggle_sort(&mut self, field: SortField) {
        self.list_view.toggle_sort(field);
        self.sync_selection();
    }

    /// Increase refresh rate (decrease interval by 50ms, clamp to 50ms minimum)
    pub fn increase_refresh_rate(&mut self) {
        let new_interval = self
            .refresh_config
            .refresh_ms
            .saturating_sub(config::REFRESH_STEP);
        self.refresh_config.refresh_ms = new_interval.max(config::MIN_REFRESH_MS);
        self.refresh_config.last_change = Some(Instant::now());
    }

    /// Decrease refresh rate (increase interval by 50ms, clamp to 10s maximum)
    pub fn decrease_refresh_rate(&mut self) {
        let new_interval = self
            .refresh_config
            .refresh_ms
            .saturating_add(config::REFRESH_STEP);
        self.refresh_config.refresh_ms = new_interval.min(config::MAX_REFRESH_MS);
        self.refresh_config.last_change = Some(Instant::now());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::device::tests::sample_device;
    use crate::device::{DeviceClass, ScanResult};
    use proptest::prelude::*;
    use std::sync::mpsc::{self, Receiver, Sender};

    /// App wired to in-memory channels instead of a worker thread
    pub(crate) fn test_app() -> (AppState, Receiver<FeedCommand>, Sender<FeedEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let feed = FeedHandle::new(cmd_tx, event_rx, None, "test");
        (
            AppState::new(feed, RefreshConfig::default(), false),
            cmd_rx,
            event_tx,
        )
    }

    /// Three devices: router .1, computer .50 (offline), printer .20
    pub(crate) fn populated_app() -> (AppState, Receiver<FeedCommand>, Sender<FeedEvent>) {
        let (mut app, cmd_rx, event_tx) = test_app();
        let mut offline = sample_device("b", "192.168.1.50", DeviceClass::Computer);
        offline.status = DeviceStatus::Offline;
        let devices = vec![
            sample_device("a", "192.168.1.1", DeviceClass::Router),
            offline,
            sample_device("c", "192.168.1.20", DeviceClass::Printer),
        ];
        event_tx
            .send(FeedEvent::Message(FeedMessage::DevicesList { devices }))
            .unwrap();
        app.process_feed_events();
        (app, cmd_rx, event_tx)
    }

    fn selected(app: &AppState) -> Option<&str> {
        app.selected_id.as_deref()
    }

    #[test]
    fn test_initial_scan_requested() {
        let (_app, cmd_rx, _event_tx) = test_app();
        assert_eq!(cmd_rx.try_recv().unwrap(), FeedCommand::Scan);
    }

    #[test]
    fn test_scan_not_repeated_while_scanning() {
        let (mut app, cmd_rx, event_tx) = test_app();
        assert_eq!(cmd_rx.try_recv().unwrap(), FeedCommand::Scan);

        event_tx
            .send(FeedEvent::Message(FeedMessage::ScanStarted {}))
            .unwrap();
        app.process_feed_events();
        app.start_scan();
        assert!(cmd_rx.try_recv().is_err());

        event_tx
            .send(FeedEvent::Message(FeedMessage::ScanCompleted(ScanResult {
                timestamp: crate::device::tests::timestamp(12, 0),
                network_cidr: "192.168.1.0/24".to_string(),
                gateway_ip: "192.168.1.1".to_string(),
                devices: Vec::new(),
                scan_duration: 10.0,
            })))
            .unwrap();
        app.process_feed_events();
        app.start_scan();
        assert_eq!(cmd_rx.try_recv().unwrap(), FeedCommand::Scan);
    }

    #[test]
    fn test_device_selection_navigation() {
        let (mut app, _cmd_rx, _event_tx) = test_app();

        // Empty list
        app.select_next_device();
        assert_eq!(selected(&app), None);
        app.select_previous_device();
        assert_eq!(selected(&app), None);

        let (mut app, _cmd_rx, _event_tx) = populated_app();

        // Sorted by last octet: a (.1), c (.20), b (.50)
        app.select_next_device();
        assert_eq!(selected(&app), Some("a"));
        app.select_next_device();
        assert_eq!(selected(&app), Some("c"));
        app.select_next_device();
        assert_eq!(selected(&app), Some("b"));

        // Try to go beyond bounds (should stay on the last row)
        app.select_next_device();
        assert_eq!(selected(&app), Some("b"));
        assert_eq!(app.device_list_state.selected(), Some(2));

        app.select_previous_device();
        app.select_previous_device();
        app.select_previous_device();
        assert_eq!(selected(&app), Some("a"));

        // From no selection, going up starts at the last row
        app.selected_id = None;
        app.device_list_state.select(None);
        app.select_previous_device();
        assert_eq!(selected(&app), Some("b"));
    }

    #[test]
    fn test_selection_follows_device_when_resorted() {
        let (mut app, _cmd_rx, _event_tx) = populated_app();
        app.select_next_device();
        assert_eq!(app.device_list_state.selected(), Some(0));

        app.toggle_sort(SortField::Ip);
        assert_eq!(selected(&app), Some("a"));
        assert_eq!(app.device_list_state.selected(), Some(2));
    }

    #[test]
    fn test_filtered_out_selection_keeps_id() {
        let (mut app, _cmd_rx, _event_tx) = populated_app();
        app.select_next_device();

        app.cycle_status_filter(); // online only
        app.cycle_status_filter(); // offline only
        assert_eq!(selected(&app), Some("a"));
        assert_eq!(app.device_list_state.selected(), None);
        assert_eq!(app.selected_device().map(|d| d.ip.as_str()), Some("192.168.1.1"));
    }

    #[test]
    fn test_search_editing() {
        let (mut app, _cmd_rx, _event_tx) = populated_app();
        app.begin_search();
        for c in "1.2".chars() {
            app.push_search_char(c);
        }
        let ids: Vec<&str> = app.visible_devices().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);

        app.pop_search_char();
        app.end_search(true);
        assert!(!app.search_active);
        assert_eq!(app.list_view.search, "1.");

        app.begin_search();
        app.end_search(false);
        assert!(app.list_view.search.is_empty());
    }

    #[test]
    fn test_radar_hides_offline_when_toggled() {
        let (mut app, _cmd_rx, _event_tx) = populated_app();
        assert_eq!(app.radar_devices().len(), 3);

        app.radar_settings.show_offline = false;
        let ids: Vec<&str> = app.radar_devices().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_probe_selected_sends_gateway() {
        let (mut app, cmd_rx, event_tx) = populated_app();
        while cmd_rx.try_recv().is_ok() {}

        // Nothing selected: no command
        app.probe_selected();
        assert!(cmd_rx.try_recv().is_err());

        app.select_next_device();
        app.probe_selected();
        match cmd_rx.try_recv().unwrap() {
            FeedCommand::ProbePorts { device, gateway_ip } => {
                assert_eq!(device.id, "a");
                assert_eq!(gateway_ip, "");
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(app.pending_probe.as_deref(), Some("a"));

        let probed = sample_device("a", "192.168.1.1", DeviceClass::Router);
        event_tx
            .send(FeedEvent::Message(FeedMessage::DeviceUpdated(probed)))
            .unwrap();
        app.process_feed_events();
        assert_eq!(app.pending_probe, None);
    }

    #[test]
    fn test_probe_not_pending_when_worker_gone() {
        let (mut app, cmd_rx, _event_tx) = populated_app();
        drop(cmd_rx);

        app.select_next_device();
        app.probe_selected();
        assert_eq!(app.pending_probe, None);
        assert!(app.store.last_error().is_some());
    }

    #[test]
    fn test_feed_state_transitions() {
        let (mut app, _cmd_rx, event_tx) = test_app();
        assert_eq!(app.feed_state, FeedState::Connecting);

        event_tx.send(FeedEvent::Connected).unwrap();
        app.process_feed_events();
        assert_eq!(app.feed_state, FeedState::Connected);

        event_tx
            .send(FeedEvent::Message(FeedMessage::ScanStarted {}))
            .unwrap();
        event_tx.send(FeedEvent::Error("connection reset".to_string())).unwrap();
        event_tx.send(FeedEvent::Disconnected).unwrap();
        app.process_feed_events();
        assert_eq!(app.feed_state, FeedState::Disconnected);
        assert!(!app.store.is_scanning());
        assert_eq!(app.store.last_error(), Some("connection reset"));

        event_tx.send(FeedEvent::Connected).unwrap();
        app.process_feed_events();
        assert_eq!(app.store.last_error(), None);
    }

    #[test]
    fn test_removed_device_clears_selection() {
        let (mut app, _cmd_rx, event_tx) = populated_app();
        app.select_next_device();

        event_tx
            .send(FeedEvent::Message(FeedMessage::DevicesList {
                devices: vec![sample_device("c", "192.168.1.20", DeviceClass::Printer)],
            }))
            .unwrap();
        app.process_feed_events();
        assert_eq!(selected(&app), None);
        assert_eq!(app.device_list_state.selected(), None);
    }

    #[test]
    fn test_sweep_paused_when_disabled() {
        let (mut app, _cmd_rx, _event_tx) = test_app();
        app.radar_settings.sweep_enabled = false;
        app.last_tick = Instant::now() - std::time::Duration::from_millis(200);
        app.on_tick();
        assert_eq!(app.sweep_phase, 0.0);
        assert!(app.pulse_phase > 0.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Refresh interval stays within bounds for any sequence of adjustments
        #[test]
        fn prop_refresh_rate_bounded(steps in proptest::collection::vec(any::<bool>(), 0..400)) {
            let (mut app, _cmd_rx, _event_tx) = test_app();
            for faster in steps {
                if faster {
                    app.increase_refresh_rate();
                } else {
                    app.decrease_refresh_rate();
                }
                prop_assert!(app.refresh_config.refresh_ms >= config::MIN_REFRESH_MS);
                prop_assert!(app.refresh_config.refresh_ms <= config::MAX_REFRESH_MS);
            }
        }

        /// Selection always points at a visible row after navigation
        #[test]
        fn prop_selection_in_bounds(moves in proptest::collection::vec(any::<bool>(), 1..30)) {
            let (mut app, _cmd_rx, _event_tx) = populated_app();
            for down in moves {
                if down {
                    app.select_next_device();
                } else {
                    app.select_previous_device();
                }
                let len = app.visible_devices().len();
                let row = app.device_list_state.selected();
                prop_assert!(row.is_some_and(|r| r < len));
                let id = app.visible_devices()[row.unwrap()].id.clone();
                prop_assert_eq!(app.selected_id.clone(), Some(id));
            }
        }
    }
}
