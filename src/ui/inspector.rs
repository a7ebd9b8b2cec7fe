// Device Inspector rendering module
//
// Renders the detail panel for the selected device: identity, status,
// timing, open ports and where the device sits on the radar.

use crate::app::config::DEFAULT_REFRESH_MS;
use crate::app::AppState;
use crate::device::{format_mac, last_seen_label, NetworkDevice};
use crate::radar::{device_position, RadarLayout};
use crate::theme::status::status_icon;
use crate::theme::{get_refresh_color, status_color, ACCENT_VIOLET, GRID_CYAN, RADAR_CYAN, TEXT_MUTED};
use chrono::{Local, NaiveDateTime};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

// ============================================================================
// Device Inspector View Model
// ============================================================================

/// View model for the inspector panel
///
/// Contains all data needed to render the inspector, extracted from AppState.
/// This separates data extraction from rendering logic.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInspectorView {
    /// Title line: hostname or IP
    pub title: String,
    pub icon: &'static str,
    /// Labelled rows in display order
    pub fields: Vec<(&'static str, String)>,
    pub status_text: String,
    pub status_color: Color,
    /// "number/protocol service" for every port
    pub ports: Vec<String>,
    /// Angle in degrees and distance as a fraction of the radar radius
    pub polar: Option<(f64, f64)>,
    /// Whether a device is selected
    pub has_selection: bool,
}

impl Default for DeviceInspectorView {
    fn default() -> Self {
        Self {
            title: "No device selected".to_string(),
            icon: "◌",
            fields: Vec::new(),
            status_text: "Idle".to_string(),
            status_color: TEXT_MUTED,
            ports: Vec::new(),
            polar: None,
            has_selection: false,
        }
    }
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("—").to_string()
}

/// Build the view for one device
pub fn build_device_view(
    device: &NetworkDevice,
    layout: &RadarLayout,
    now: NaiveDateTime,
) -> DeviceInspectorView {
    let position = device_position(device, layout);
    let latency = device
        .response_time
        .map(|ms| format!("{:.0} ms", ms))
        .unwrap_or_else(|| "—".to_string());

    DeviceInspectorView {
        title: device.display_name().to_string(),
        icon: device.device_type.icon(),
        fields: vec![
            ("IP", device.ip.clone()),
            ("Hostname", or_dash(device.hostname.as_deref())),
            ("Type", device.device_type.display_name().to_string()),
            ("Vendor", or_dash(device.vendor.as_deref())),
            ("MAC", format_mac(&device.mac)),
            (
                "Last seen",
                format!(
                    "{} ({})",
                    device.last_seen.format("%Y-%m-%d %H:%M:%S"),
                    last_seen_label(device.last_seen, now)
                ),
            ),
            ("Latency", latency),
            ("First seen", device.first_seen.format("%Y-%m-%d %H:%M").to_string()),
        ],
        status_text: format!("{} {}", status_icon(device.status), device.status.as_str()),
        status_color: status_color(device.status),
        ports: device.ports.iter().map(|p| p.format_display()).collect(),
        polar: Some((
            position.angle_degrees,
            position.distance / layout.max_radius,
        )),
        has_selection: true,
    }
}

/// Build DeviceInspectorView from AppState
pub fn build_device_inspector_view(app: &AppState, layout: &RadarLayout) -> DeviceInspectorView {
    match app.selected_device() {
        Some(device) => build_device_view(device, layout, Local::now().naive_local()),
        None => DeviceInspectorView::default(),
    }
}

pub fn render_device_inspector(f: &mut Frame, area: Rect, app: &AppState, layout: &RadarLayout) {
    let view = build_device_inspector_view(app, layout);
    let label_style = Style::default().fg(Color::DarkGray);

    let mut lines = vec![Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{} {}", view.icon, view.title),
            Style::default().fg(ACCENT_VIOLET).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            view.status_text.clone(),
            Style::default()
                .fg(view.status_color)
                .add_modifier(Modifier::BOLD),
        ),
    ])];

    if !view.has_selection {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Select a device with ↑/↓",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    for (label, value) in &view.fields {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<11}", label), label_style),
            Span::styled(value.clone(), Style::default().fg(TEXT_MUTED)),
        ]));
    }

    if let Some((angle, factor)) = view.polar {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<11}", "Radar"), label_style),
            Span::styled(
                format!("{:.1}° at {:.0}% radius", angle, factor * 100.0),
                Style::default().fg(RADAR_CYAN),
            ),
        ]));
    }

    if view.has_selection {
        let probing = app.pending_probe.is_some()
            && app.pending_probe.as_deref() == app.selected_id.as_deref();
        let ports_text = if probing {
            "probing…".to_string()
        } else if view.ports.is_empty() {
            "none known (p to probe)".to_string()
        } else {
            view.ports.join(", ")
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<11}", "Ports"), label_style),
            Span::styled(ports_text, Style::default().fg(Color::Cyan)),
        ]));
    }

    let refresh_ms = app.refresh_config.refresh_ms;
    let recently_changed = app.refresh_config.recently_changed();
    let refresh_color = get_refresh_color(refresh_ms, DEFAULT_REFRESH_MS, recently_changed);
    let refresh_style = if recently_changed {
        Style::default()
            .fg(refresh_color)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(refresh_color)
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("  ⚡ Refresh: "),
        Span::styled(format!("{}ms", refresh_ms), refresh_style),
    ]));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(vec![
                    Span::styled(
                        "━ ⌖ Inspector ",
                        Style::default().fg(RADAR_CYAN).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled("━━━━━━", Style::default().fg(RADAR_CYAN)),
                ])
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(GRID_CYAN)),
        );

    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::populated_app;
    use crate::device::tests::{sample_device, timestamp};
    use crate::device::{DeviceClass, Port};
    use crate::radar::layout::calculate_radar_layout;

    fn field<'a>(view: &'a DeviceInspectorView, label: &str) -> &'a str {
        view.fields
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing field {}", label))
    }

    #[test]
    fn test_device_view_fields() {
        let mut device = sample_device("a", "192.168.1.9", DeviceClass::Printer);
        device.mac = "aabbccddeeff".to_string();
        device.vendor = Some("Brother Industries".to_string());
        device.response_time = Some(12.4);
        device.ports = vec![Port::open_tcp(9100, "JetDirect"), Port::open_tcp(631, "IPP")];

        let (layout, _) = calculate_radar_layout(80, 40);
        let view = build_device_view(&device, &layout, timestamp(14, 0));

        assert!(view.has_selection);
        assert_eq!(view.title, "192.168.1.9");
        assert_eq!(field(&view, "MAC"), "AA:BB:CC:DD:EE:FF");
        assert_eq!(field(&view, "Hostname"), "—");
        assert_eq!(field(&view, "Vendor"), "Brother Industries");
        assert_eq!(field(&view, "Latency"), "12 ms");
        assert!(field(&view, "Last seen").ends_with("(2h ago)"));
        assert_eq!(view.ports, vec!["9100/tcp JetDirect", "631/tcp IPP"]);
        assert_eq!(view.status_text, "● online");
    }

    #[test]
    fn test_polar_coordinates_match_radar() {
        let device = sample_device("device-1", "192.168.1.101", DeviceClass::Router);
        let (layout, _) = calculate_radar_layout(80, 40);
        let view = build_device_view(&device, &layout, timestamp(12, 0));

        let position = device_position(&device, &layout);
        let (angle, factor) = view.polar.unwrap();
        assert_eq!(angle, position.angle_degrees);
        assert!((0.15..=0.90).contains(&factor));
    }

    #[test]
    fn test_no_selection_view() {
        let (app, _cmd_rx, _event_tx) = populated_app();
        let (layout, _) = calculate_radar_layout(80, 40);
        let view = build_device_inspector_view(&app, &layout);
        assert_eq!(view, DeviceInspectorView::default());
    }

    #[test]
    fn test_selected_view_follows_selection() {
        let (mut app, _cmd_rx, _event_tx) = populated_app();
        app.select_next_device();
        let (layout, _) = calculate_radar_layout(80, 40);
        let view = build_device_inspector_view(&app, &layout);
        assert_eq!(field(&view, "IP"), "192.168.1.1");
        assert_eq!(field(&view, "Type"), DeviceClass::Router.display_name());
    }
}
