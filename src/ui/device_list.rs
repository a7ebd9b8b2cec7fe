// Device List rendering module
//
// Renders the scrollable device list with status coloring, the active
// search query, status filter and sort order.

use crate::app::{AppState, ListView, SortField, StatusFilter};
use crate::device::{last_seen_label, NetworkDevice};
use crate::theme::status::status_icon;
use crate::theme::{status_color, ACCENT_VIOLET, GRID_CYAN, RADAR_CYAN, SELECTION_BG, TEXT_MUTED};
use chrono::{Local, NaiveDateTime};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem},
    Frame,
};

/// Hostname column width in terminal columns
const NAME_COLS: usize = 16;

/// One list row as styled spans
fn device_row(device: &NetworkDevice, now: NaiveDateTime) -> Line<'static> {
    let color = status_color(device.status);
    let name = super::truncate_to_width(device.display_name(), NAME_COLS);

    Line::from(vec![
        Span::styled(format!(" {} ", status_icon(device.status)), Style::default().fg(color)),
        Span::styled(format!("{:<15} ", device.ip), Style::default().fg(color)),
        Span::styled(format!("{:<16} ", name), Style::default().fg(TEXT_MUTED)),
        Span::styled(
            format!("{} {:<8} ", device.device_type.icon(), device.device_type.as_str()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            last_seen_label(device.last_seen, now),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Sort header spans; the active field carries the direction arrow
fn sort_spans(view: &ListView) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (idx, field) in SortField::ALL.iter().enumerate() {
        let active = *field == view.sort_field;
        let text = if active {
            format!("{}:{}{} ", idx + 1, field.label(), view.sort_direction.arrow())
        } else {
            format!("{}:{} ", idx + 1, field.label())
        };
        let style = if active {
            Style::default().fg(ACCENT_VIOLET).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(text, style));
    }
    spans
}

/// Bottom title: search query and status filter
fn search_spans(view: &ListView, editing: bool) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if editing || !view.search.is_empty() {
        let cursor = if editing { "▏" } else { "" };
        spans.push(Span::styled(
            format!(" /{}{} ", view.search, cursor),
            Style::default().fg(if editing { ACCENT_VIOLET } else { TEXT_MUTED }),
        ));
    }
    if view.status_filter != StatusFilter::All {
        spans.push(Span::styled(
            format!(" filter: {} ", view.status_filter.label()),
            Style::default().fg(RADAR_CYAN),
        ));
    }
    spans
}

pub fn render_device_list(f: &mut Frame, area: Rect, app: &mut AppState) {
    let now = Local::now().naive_local();

    let rows = app.visible_devices();
    let shown = rows.len();
    let mut items: Vec<ListItem> = rows
        .iter()
        .map(|device| ListItem::new(device_row(device, now)))
        .collect();

    if items.is_empty() {
        let message = if app.list_view.is_filtered() {
            "  (no devices match)"
        } else {
            "  (no devices yet)"
        };
        items.push(ListItem::new(Line::from(Span::styled(
            message,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))));
    }

    let mut title = vec![Span::styled(
        format!("━ ☰ Devices ({}/{}) ", shown, app.store.len()),
        Style::default().fg(RADAR_CYAN).add_modifier(Modifier::BOLD),
    )];
    title.extend(sort_spans(&app.list_view));

    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .title_bottom(search_spans(&app.list_view, app.search_active))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(GRID_CYAN)),
        )
        .highlight_style(Style::default().bg(SELECTION_BG).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶");

    f.render_stateful_widget(list, area, &mut app.device_list_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::populated_app;
    use crate::device::tests::{sample_device, timestamp};
    use crate::device::DeviceClass;
    use crate::ui::tests::{buffer_text, render};

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_device_row_contents() {
        let mut device = sample_device("a", "192.168.1.20", DeviceClass::Printer);
        device.hostname = Some("printer-office".to_string());
        let text = line_text(&device_row(&device, timestamp(12, 5)));

        assert!(text.contains("192.168.1.20"));
        assert!(text.contains("printer-office"));
        assert!(text.contains("printer"));
        assert!(text.contains("5m ago"));
    }

    #[test]
    fn test_sort_spans_mark_active_field() {
        let mut view = ListView::default();
        view.toggle_sort(SortField::Status);
        view.toggle_sort(SortField::Status);
        let text: String = sort_spans(&view).iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("2:Status↓"));
        assert!(text.contains("1:IP "));
    }

    #[test]
    fn test_search_spans() {
        let mut view = ListView::default();
        assert!(search_spans(&view, false).is_empty());

        view.search = "nas".to_string();
        let text: String = search_spans(&view, true).iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("/nas▏"));

        view.cycle_status_filter();
        let text: String = search_spans(&view, false).iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("filter: online"));
        assert!(!text.contains('▏'));
    }

    #[test]
    fn test_filtered_empty_message() {
        let (mut app, _cmd_rx, _event_tx) = populated_app();
        app.list_view.search = "zzz".to_string();
        let text = buffer_text(&render(&mut app, 140, 40));
        assert!(text.contains("(no devices match)"));
        assert!(text.contains("Devices (0/3)"));
    }
}
