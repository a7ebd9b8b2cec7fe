// Header rendering module
//
// Renders the top bar with the title, feed source and global stats.

use crate::app::AppState;
use crate::store::ScanInfo;
use crate::theme::{ACCENT_VIOLET, GRID_CYAN, ONLINE_GREEN, RADAR_CYAN, TEXT_MUTED, UNKNOWN_AMBER};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

/// "12:30:05 (1234 ms)" for the last completed scan
fn last_scan_text(info: Option<&ScanInfo>) -> String {
    match info {
        Some(info) => format!(
            "{} ({:.0} ms)",
            info.timestamp.format("%H:%M:%S"),
            info.scan_duration
        ),
        None => "never".to_string(),
    }
}

pub fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let counts = app.store.counts();
    let last_scan = app.store.last_scan();

    let title_line = Line::from(vec![
        Span::styled(
            " ◎ NETWORK RADAR ",
            Style::default().fg(RADAR_CYAN).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" Real-time network monitor", Style::default().fg(TEXT_MUTED)),
        Span::styled(
            format!("   source: {} [{}]", app.source_label(), app.feed_state.label()),
            Style::default().fg(GRID_CYAN),
        ),
    ]);

    let mut stats = vec![
        Span::styled(
            format!(" ● {} online", counts.online),
            Style::default().fg(ONLINE_GREEN).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("◆ {} devices", app.store.len()),
            Style::default().fg(ACCENT_VIOLET),
        ),
        Span::raw("  "),
        Span::styled(
            format!("⏱ last scan {}", last_scan_text(last_scan)),
            Style::default().fg(TEXT_MUTED),
        ),
    ];

    if let Some(info) = last_scan {
        stats.push(Span::styled(
            format!("  {} • gateway {}", info.network_cidr, info.gateway_ip),
            Style::default().fg(GRID_CYAN),
        ));
    }

    if app.store.is_scanning() {
        stats.push(Span::styled(
            "  ⟳ scanning…",
            Style::default()
                .fg(UNKNOWN_AMBER)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(vec![title_line, Line::from(stats)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(RADAR_CYAN)),
        )
        .alignment(Alignment::Left);

    f.render_widget(header, area);
}
