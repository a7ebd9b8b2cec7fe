// Status Bar rendering module
//
// Renders the bottom status bar with keyboard shortcuts, toggle indicators
// and the latest feed problem, if any.

use crate::app::{AppState, FeedState};
use crate::theme::{GRID_CYAN, OFFLINE_RED, ONLINE_GREEN, RADAR_CYAN, TEXT_MUTED, UNKNOWN_AMBER};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// A key hint; lower priority numbers survive narrow terminals
struct Hint {
    priority: u8,
    key: &'static str,
    desc: &'static str,
}

const BROWSE_HINTS: &[Hint] = &[
    Hint { priority: 1, key: "Q:", desc: "Quit | " },
    Hint { priority: 1, key: "↑↓:", desc: "Select | " },
    Hint { priority: 1, key: "N:", desc: "Scan | " },
    Hint { priority: 1, key: "/:", desc: "Search | " },
    Hint { priority: 2, key: "P:", desc: "Ports | " },
    Hint { priority: 2, key: "F:", desc: "Filter | " },
    Hint { priority: 2, key: "1-4:", desc: "Sort | " },
    Hint { priority: 3, key: "+/-:", desc: "Speed | " },
];

const SEARCH_HINTS: &[Hint] = &[
    Hint { priority: 1, key: "Enter:", desc: "Keep | " },
    Hint { priority: 1, key: "Esc:", desc: "Clear | " },
    Hint { priority: 2, key: "↑↓:", desc: "Select | " },
];

/// Hint spans that fit in `available` columns, highest priority first
fn fit_hints(hints: &[Hint], available: usize) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut used = 0;

    for priority in 1..=3 {
        for hint in hints.iter().filter(|h| h.priority == priority) {
            let len = hint.key.width() + hint.desc.width();
            if used + len <= available {
                spans.push(Span::styled(
                    hint.key,
                    Style::default().fg(RADAR_CYAN).add_modifier(Modifier::BOLD),
                ));
                spans.push(Span::styled(hint.desc, Style::default().fg(TEXT_MUTED)));
                used += len;
            }
        }
    }
    spans
}

fn toggle(key: &'static str, on: bool) -> [Span<'static>; 3] {
    let (state, color) = if on { ("ON", ONLINE_GREEN) } else { ("OFF", TEXT_MUTED) };
    [
        Span::styled(format!("[{}:", key), Style::default().fg(TEXT_MUTED)),
        Span::styled(state, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled("] ", Style::default().fg(TEXT_MUTED)),
    ]
}

/// Build toggle status indicator spans for the status bar
/// Shows [L:ON/OFF] [W:ON/OFF] [O:ON/OFF] and the feed state
pub fn build_toggle_indicators(app: &AppState) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    spans.extend(toggle("L", app.radar_settings.labels_enabled));
    spans.extend(toggle("W", app.radar_settings.sweep_enabled));
    spans.extend(toggle("O", app.radar_settings.show_offline));

    let feed_color = match app.feed_state {
        FeedState::Connected => ONLINE_GREEN,
        FeedState::Connecting => UNKNOWN_AMBER,
        FeedState::Disconnected => OFFLINE_RED,
    };
    spans.push(Span::styled(
        format!("● {}", app.feed_state.label()),
        Style::default().fg(feed_color),
    ));
    spans
}

pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans = vec![Span::styled(" ◎ ", Style::default().fg(RADAR_CYAN))];

    // Errors take the place of the hints
    if let Some(error) = app.store.last_error() {
        let max = usize::from(area.width.saturating_sub(40));
        spans.push(Span::styled(
            format!("⚠ {} ", super::truncate_to_width(error, max)),
            Style::default().fg(OFFLINE_RED).add_modifier(Modifier::BOLD),
        ));
    } else {
        let hints = if app.search_active {
            SEARCH_HINTS
        } else {
            BROWSE_HINTS
        };
        // Leave room for the borders, icon and toggle indicators
        let available = usize::from(area.width).saturating_sub(4 + 36);
        spans.extend(fit_hints(hints, available));
    }

    spans.extend(build_toggle_indicators(app));

    let status_bar = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(GRID_CYAN)),
        )
        .alignment(Alignment::Left);

    f.render_widget(status_bar, area);
}
