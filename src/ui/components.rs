//! Styled spans for the pump status line

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::status::{Piece, Role, StatusLine};
use crate::theme::Theme;

pub fn piece_style(role: Role, theme: &Theme) -> Style {
    match role {
        Role::Value => Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        Role::Unit => Style::default().fg(theme.text_dim),
        Role::UrgentUnit | Role::Alert => Style::default().fg(theme.critical),
        Role::Placeholder => Style::default().fg(theme.text_dim),
        Role::Badge => Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
        Role::Gauge => Style::default().fg(theme.insulin),
        Role::GaugeLabel => Style::default().fg(theme.text).add_modifier(Modifier::DIM),
        Role::ClockOffset => Style::default().fg(theme.warning),
        Role::Battery(severity) => Style::default().fg(theme.severity(severity)),
    }
}

fn piece_span(piece: &Piece, theme: &Theme) -> Span<'static> {
    Span::styled(piece.text.clone(), piece_style(piece.role, theme))
}

/// The status line as a single ratatui line
pub fn status_line(line: &StatusLine, theme: &Theme) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, group) in line.groups().iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.extend(group.iter().map(|p| piece_span(p, theme)));
    }
    Line::from(spans)
}
