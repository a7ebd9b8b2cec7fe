// Keyboard event handling
//
// This module contains the keyboard event handler that processes
// user input and updates the application state accordingly.

use super::{AppState, SortField};
use crossterm::event::KeyCode;

/// Handle keyboard events and update application state
///
/// Returns `true` if the application should continue running,
/// `false` if it should exit.
///
/// # Arguments
/// * `app` - Mutable reference to the application state
/// * `key` - The key code that was pressed
///
/// # Key Bindings
/// - `q`, `Q`, `Esc` - Quit the application (Esc leaves search first)
/// - `Up` / `Down` - Select previous / next device
/// - `/` - Search; type to filter, `Backspace` deletes, `Enter` keeps, `Esc` clears
/// - `f`, `F` - Cycle status filter
/// - `1`-`4` - Sort by IP, status, type, activity (again to flip direction)
/// - `n`, `N` - Start a new scan
/// - `p`, `P` - Probe ports of the selected device
/// - `l`, `L` - Toggle radar labels
/// - `w`, `W` - Toggle sweep animation
/// - `o`, `O` - Toggle offline devices on the radar
/// - `+`, `=` - Slower refresh (longer interval)
/// - `-`, `_` - Faster refresh (shorter interval)
pub fn handle_key_event(app: &mut AppState, key: KeyCode) -> bool {
    if app.search_active {
        handle_search_key(app, key);
        return true;
    }

    match key {
        // Quit on 'q', 'Q', or Esc
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            app.running = false;
            false
        }
        // Navigate devices with arrow keys
        KeyCode::Up => {
            app.select_previous_device();
            true
        }
        KeyCode::Down => {
            app.select_next_device();
            true
        }
        KeyCode::Char('/') => {
            app.begin_search();
            true
        }
        KeyCode::Char('f') | KeyCode::Char('F') => {
            app.cycle_status_filter();
            true
        }
        KeyCode::Char(c @ '1'..='4') => {
            let idx = (c as usize) - ('1' as usize);
            app.toggle_sort(SortField::ALL[idx]);
            true
        }
        KeyCode::Char('n') | KeyCode::Char('N') => {
            app.start_scan();
            true
        }
        KeyCode::Char('p') | KeyCode::Char('P') => {
            app.probe_selected();
            true
        }
        KeyCode::Char('l') | KeyCode::Char('L') => {
            app.radar_settings.labels_enabled = !app.radar_settings.labels_enabled;
            true
        }
        KeyCode::Char('w') | KeyCode::Char('W') => {
            app.radar_settings.sweep_enabled = !app.radar_settings.sweep_enabled;
            true
        }
        KeyCode::Char('o') | KeyCode::Char('O') => {
            app.radar_settings.show_offline = !app.radar_settings.show_offline;
            true
        }
        // Refresh rate controls (unified)
        // + = slower refresh (increase interval)
        // - = faster refresh (decrease interval)
        KeyCode::Char('+') | KeyCode::Char('=') => {
            app.decrease_refresh_rate();
            true
        }
        KeyCode::Char('-') | KeyCode::Char('_') => {
            app.increase_refresh_rate();
            true
        }
        _ => true,
    }
}

/// Keys while the search query is being edited
fn handle_search_key(app: &mut AppState, key: KeyCode) {
    match key {
        KeyCode::Enter => app.end_search(true),
        KeyCode::Esc => app.end_search(false),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Up => app.select_previous_device(),
        KeyCode::Down => app.select_next_device(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{populated_app, test_app};
    use crate::app::{SortDirection, StatusFilter};
    use crate::device::DeviceStatus;
    use crate::feed::FeedCommand;

    #[test]
    fn test_quit_keys() {
        let (mut app, _cmd_rx, _event_tx) = test_app();

        // Test 'q' key
        assert!(app.running);
        let result = handle_key_event(&mut app, KeyCode::Char('q'));
        assert!(!result);
        assert!(!app.running);

        // Reset and test 'Q' key
        app.running = true;
        let result = handle_key_event(&mut app, KeyCode::Char('Q'));
        assert!(!result);
        assert!(!app.running);

        // Reset and test Esc key
        app.running = true;
        let result = handle_key_event(&mut app, KeyCode::Esc);
        assert!(!result);
        assert!(!app.running);
    }

    #[test]
    fn test_esc_leaves_search_before_quitting() {
        let (mut app, _cmd_rx, _event_tx) = test_app();
        handle_key_event(&mut app, KeyCode::Char('/'));
        handle_key_event(&mut app, KeyCode::Char('q'));
        assert!(app.search_active);
        assert_eq!(app.list_view.search, "q");
        assert!(app.running);

        assert!(handle_key_event(&mut app, KeyCode::Esc));
        assert!(!app.search_active);
        assert!(app.list_view.search.is_empty());
        assert!(app.running);

        assert!(!handle_key_event(&mut app, KeyCode::Esc));
    }

    #[test]
    fn test_search_typing() {
        let (mut app, _cmd_rx, _event_tx) = populated_app();
        handle_key_event(&mut app, KeyCode::Char('/'));
        for c in ".200".chars() {
            handle_key_event(&mut app, KeyCode::Char(c));
        }
        handle_key_event(&mut app, KeyCode::Backspace);
        handle_key_event(&mut app, KeyCode::Enter);

        assert!(!app.search_active);
        assert_eq!(app.list_view.search, ".20");
        assert_eq!(app.visible_devices().len(), 1);

        // Letters are shortcuts again once the search is closed
        handle_key_event(&mut app, KeyCode::Char('f'));
        assert_eq!(app.list_view.status_filter, StatusFilter::Only(DeviceStatus::Online));
    }

    #[test]
    fn test_sort_keys() {
        let (mut app, _cmd_rx, _event_tx) = test_app();
        handle_key_event(&mut app, KeyCode::Char('3'));
        assert_eq!(app.list_view.sort_field, SortField::Type);
        assert_eq!(app.list_view.sort_direction, SortDirection::Asc);

        handle_key_event(&mut app, KeyCode::Char('3'));
        assert_eq!(app.list_view.sort_direction, SortDirection::Desc);

        handle_key_event(&mut app, KeyCode::Char('4'));
        assert_eq!(app.list_view.sort_field, SortField::LastSeen);
        assert_eq!(app.list_view.sort_direction, SortDirection::Asc);

        handle_key_event(&mut app, KeyCode::Char('1'));
        assert_eq!(app.list_view.sort_field, SortField::Ip);
    }

    #[test]
    fn test_radar_toggles() {
        let (mut app, _cmd_rx, _event_tx) = test_app();

        // Defaults: everything on
        assert!(app.radar_settings.labels_enabled);
        assert!(app.radar_settings.sweep_enabled);
        assert!(app.radar_settings.show_offline);

        handle_key_event(&mut app, KeyCode::Char('l'));
        handle_key_event(&mut app, KeyCode::Char('w'));
        handle_key_event(&mut app, KeyCode::Char('o'));
        assert!(!app.radar_settings.labels_enabled);
        assert!(!app.radar_settings.sweep_enabled);
        assert!(!app.radar_settings.show_offline);

        handle_key_event(&mut app, KeyCode::Char('L'));
        handle_key_event(&mut app, KeyCode::Char('W'));
        handle_key_event(&mut app, KeyCode::Char('O'));
        assert!(app.radar_settings.labels_enabled);
        assert!(app.radar_settings.sweep_enabled);
        assert!(app.radar_settings.show_offline);
    }

    #[test]
    fn test_refresh_rate_keys() {
        let (mut app, _cmd_rx, _event_tx) = test_app();
        let initial = app.refresh_config.refresh_ms;

        handle_key_event(&mut app, KeyCode::Char('+'));
        assert_eq!(app.refresh_config.refresh_ms, initial + 50);
        assert!(app.refresh_config.recently_changed());

        handle_key_event(&mut app, KeyCode::Char('-'));
        handle_key_event(&mut app, KeyCode::Char('_'));
        assert_eq!(app.refresh_config.refresh_ms, initial - 50);
    }

    #[test]
    fn test_scan_and_probe_keys() {
        let (mut app, cmd_rx, _event_tx) = populated_app();
        while cmd_rx.try_recv().is_ok() {}

        handle_key_event(&mut app, KeyCode::Char('n'));
        assert_eq!(cmd_rx.try_recv().unwrap(), FeedCommand::Scan);

        handle_key_event(&mut app, KeyCode::Down);
        handle_key_event(&mut app, KeyCode::Char('p'));
        assert!(matches!(
            cmd_rx.try_recv().unwrap(),
            FeedCommand::ProbePorts { .. }
        ));
    }

    #[test]
    fn test_unbound_keys_keep_running() {
        let (mut app, _cmd_rx, _event_tx) = test_app();
        assert!(handle_key_event(&mut app, KeyCode::Char('z')));
        assert!(handle_key_event(&mut app, KeyCode::Tab));
        assert!(app.running);
    }
}
