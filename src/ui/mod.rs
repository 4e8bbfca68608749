mod components;

use chrono::Local;
use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Popup};
use crate::pump::Reservoir;
use crate::status::{format_units, has_clock_offset, severity, Remaining};
use crate::theme::Theme;

pub use components::status_line;

// Load theme colors once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn critical() -> Color { theme().critical }
fn warning() -> Color { theme().warning }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3),  // Status line box
            Constraint::Min(4),     // Details box
            Constraint::Length(1),  // Info line
            Constraint::Length(1),  // Footer
        ])
        .split(area);

    draw_status_box(f, app, chunks[0]);
    draw_details_box(f, app, chunks[1]);
    draw_info_line(f, app, chunks[2]);
    draw_footer(f, chunks[3]);

    if app.popup == Popup::Help {
        draw_help_popup(f);
    }
}

fn draw_status_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Pump ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let line = status_line(&app.status_line(), theme());
    let content = Paragraph::new(line).alignment(Alignment::Center).block(block);
    f.render_widget(content, area);
}

fn detail_row(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", label), Style::default().fg(text_dim())),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn draw_details_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Details ", Style::default().fg(inactive())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    let snapshot = &app.snapshot;
    let concentration = snapshot.concentration();
    let th = theme();
    let mut lines = Vec::new();

    let name = if snapshot.name.is_empty() { "-".to_string() } else { snapshot.name.clone() };
    lines.push(detail_row("Pump", name, text()));

    let reservoir = match snapshot.reservoir {
        Some(Reservoir::Known(units)) => format!("{} U", format_units(units, concentration)),
        Some(Reservoir::Overfull) => "50+ U".to_string(),
        None => "unknown".to_string(),
    };
    let reservoir_color = th.severity(severity::reservoir_severity(snapshot.reservoir));
    lines.push(detail_row("Reservoir", reservoir, reservoir_color));

    if let Some(battery) = &snapshot.battery {
        let percent = battery
            .percent
            .map(|p| format!("{}%", p))
            .unwrap_or_else(|| "unknown".to_string());
        let color = th.severity(severity::battery_severity(Some(battery)));
        lines.push(detail_row("Battery", percent, color));
    }

    if let Some(expires_at) = snapshot.expires_at {
        let local = expires_at.with_timezone(&Local).format("%a %d %b %H:%M");
        let remaining = Remaining::until(expires_at, app.now).text();
        let color = th.severity(severity::expiry_severity(Some(expires_at), app.now));
        lines.push(detail_row("Pod expires", format!("{} ({})", local, remaining), color));
    }

    let insulin = format!("U{}", (concentration * 100.0).round() as i64);
    let insulin = if concentration != 1.0 && app.config.hide_insulin_badge {
        format!("{} (badge hidden)", insulin)
    } else {
        insulin
    };
    lines.push(detail_row("Insulin", insulin, text()));

    if let Some(tz) = snapshot.timezone() {
        let (value, color) = if has_clock_offset(Some(tz), App::local_offset()) {
            (format!("UTC{} (differs from this device)", tz), warning())
        } else {
            (format!("UTC{}", tz), text())
        };
        lines.push(detail_row("Pump clock", value, color));
    }

    if let Some(err) = &app.load_error {
        lines.push(Line::from(""));
        lines.push(detail_row("Snapshot", err.clone(), critical()));
    }

    let details = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    f.render_widget(details, area);
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.clone(), Style::default().fg(warning())))
    } else {
        Line::from(Span::styled(
            format!("Reading {}", app.snapshot_path.display()),
            Style::default().fg(text_dim()),
        ))
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let hints = [("r", "Reload"), ("b", "Badge"), ("h", "Help"), ("q", "Quit")];

    let hint_spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    f.render_widget(Paragraph::new(Line::from(hint_spans)), area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 95 } else { 60 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), Style::default().fg(accent())),
            Span::raw(desc),
        ])
    };
    let heading = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
    };

    let help_text = vec![
        heading("═══ Keys ═══"),
        key("r", "Reload the pump snapshot now"),
        key("b", "Hide/show the non-standard insulin badge"),
        key("h ?", "Toggle this help"),
        key("q", "Quit"),
        Line::from(""),
        heading("═══ Status line ═══"),
        key("120U ▆", "Pod reservoir and fill gauge"),
        key("50+", "Reservoir above the measurable range"),
        key("U200", "Non-standard insulin concentration"),
        key("◷", "Pump clock differs from this device"),
        key("2d 3h", "Time until the pod expires"),
        key("▮▮▯▯", "Pump battery"),
    ];

    let help = Paragraph::new(help_text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(Span::styled(" Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        );
    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::pump::{Battery, PumpSnapshot};
    use chrono::Utc;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;
    use std::time::Instant;

    fn app(snapshot: PumpSnapshot) -> App {
        App {
            popup: Popup::None,
            config: AppConfig::default(),
            snapshot_path: PathBuf::from("/tmp/pump.json"),
            snapshot,
            load_error: None,
            status_message: None,
            status_message_time: None,
            now: Utc::now(),
            last_reload: Instant::now(),
        }
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_empty_snapshot_renders_no_pump() {
        let screen = render(&app(PumpSnapshot::default()));
        assert!(screen.contains("No Pump"));
        assert!(screen.contains("unknown"));
    }

    #[test]
    fn test_tubed_pump_details() {
        let screen = render(&app(PumpSnapshot {
            name: "Dana-i".into(),
            reservoir: Some(Reservoir::Known(87.0)),
            battery: Some(Battery { percent: Some(42) }),
            ..Default::default()
        }));
        assert!(screen.contains("87 U"));
        assert!(screen.contains("Dana-i"));
        assert!(screen.contains("42%"));
    }

    #[test]
    fn test_load_error_is_shown() {
        let mut app = app(PumpSnapshot::default());
        app.load_error = Some("invalid snapshot".into());
        assert!(render(&app).contains("invalid snapshot"));
    }

    #[test]
    fn test_help_popup() {
        let mut app = app(PumpSnapshot::default());
        app.popup = Popup::Help;
        assert!(render(&app).contains("Status line"));
    }
}
