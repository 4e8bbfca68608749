//! Pump status line
//!
//! Turns a [`PumpSnapshot`] into a small render tree. Pods get a reservoir
//! gauge and an expiry countdown, tubed pumps get their reservoir and battery,
//! and anything missing falls back to a placeholder. The tree is frontend
//! agnostic: the TUI styles it through the theme, and waybar gets it flattened
//! by [`StatusLine::plain_text`].

pub mod remaining;
pub mod severity;

use chrono::{DateTime, FixedOffset, Utc};

use crate::pump::{PumpSnapshot, Reservoir, STANDARD_CONCENTRATION};
pub use remaining::Remaining;
pub use severity::Severity;

/// Gauge label for an overfull pod, shown once the drawing is mostly full
pub const OVERFULL_LABEL: &str = "50+";

const OVERFULL_LABEL_MAX_PORTION: f64 = 0.3;
const GAUGE_GLYPHS: [&str; 8] = ["▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];
const CLOCK_OFFSET_GLYPH: &str = "◷";

/// What the renderer looks at
#[derive(Debug, Clone)]
pub struct StatusInputs<'a> {
    pub snapshot: &'a PumpSnapshot,
    pub now: DateTime<Utc>,
    /// Offset of the device we are displaying on
    pub local_offset: FixedOffset,
    pub hide_insulin_badge: bool,
    /// Name fragments identifying pod-style pumps
    pub pod_markers: &'a [String],
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub primary: Primary,
    pub battery: Option<BatteryIndicator>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primary {
    /// Pod with a known expiry
    Pod {
        reservoir: Option<PodReservoir>,
        remaining: Remaining,
    },
    /// Pod pump without an active pod
    NoPod,
    /// Tubed pump reservoir
    Reservoir {
        badge: Option<ConcentrationBadge>,
        amount: Amount,
    },
    NoPump,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PodReservoir {
    /// Numeric units, omitted when the pod is overfull
    pub amount: Option<String>,
    pub gauge: PodGauge,
    pub badge: Option<ConcentrationBadge>,
    pub clock_offset: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PodGauge {
    /// Empty share of the drawing, see [`Reservoir::empty_portion`]
    pub empty_portion: f64,
    pub overfull_label: bool,
}

impl PodGauge {
    pub fn glyph(&self) -> &'static str {
        let filled = 1.0 - self.empty_portion;
        let idx = (filled * (GAUGE_GLYPHS.len() - 1) as f64).round() as usize;
        GAUGE_GLYPHS[idx.min(GAUGE_GLYPHS.len() - 1)]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Amount {
    Units(String),
    Overfull,
}

impl Amount {
    pub fn text(&self) -> &str {
        match self {
            Amount::Units(units) => units,
            Amount::Overfull => OVERFULL_LABEL,
        }
    }
}

/// Marks insulin other than U-100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcentrationBadge {
    pub concentration: f64,
}

impl ConcentrationBadge {
    /// e.g. "U200" for a concentration of 2
    pub fn label(&self) -> String {
        format!("U{}", (self.concentration * 100.0).round() as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryLevel {
    Full,
    ThreeQuarters,
    Half,
    Quarter,
}

impl BatteryLevel {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            81..=u8::MAX => BatteryLevel::Full,
            61..=80 => BatteryLevel::ThreeQuarters,
            41..=60 => BatteryLevel::Half,
            _ => BatteryLevel::Quarter,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            BatteryLevel::Full => "▮▮▮▮",
            BatteryLevel::ThreeQuarters => "▮▮▮▯",
            BatteryLevel::Half => "▮▮▯▯",
            BatteryLevel::Quarter => "▮▯▯▯",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryIndicator {
    pub level: BatteryLevel,
    pub severity: Severity,
    pub clock_offset: bool,
}

/// Display role of a piece of text, styled by the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Value,
    Unit,
    /// Unit of a countdown that is running out
    UrgentUnit,
    Alert,
    Placeholder,
    Badge,
    Gauge,
    GaugeLabel,
    ClockOffset,
    Battery(Severity),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub text: String,
    pub role: Role,
}

impl Piece {
    fn new(text: impl Into<String>, role: Role) -> Self {
        Self { text: text.into(), role }
    }
}

/// Round to whole units after applying the concentration
pub fn format_units(units: f64, concentration: f64) -> String {
    format!("{:.0}", units * concentration)
}

/// Pump clock differs from ours
pub fn has_clock_offset(pump: Option<FixedOffset>, local: FixedOffset) -> bool {
    pump.is_some_and(|tz| tz.local_minus_utc() != local.local_minus_utc())
}

fn badge_for(concentration: f64, hidden: bool) -> Option<ConcentrationBadge> {
    (concentration != STANDARD_CONCENTRATION && !hidden).then_some(ConcentrationBadge { concentration })
}

impl StatusLine {
    pub fn render(inputs: &StatusInputs<'_>) -> Self {
        let snapshot = inputs.snapshot;
        let concentration = snapshot.concentration();
        let clock_offset = has_clock_offset(snapshot.timezone(), inputs.local_offset);
        let pod_style = snapshot.is_pod_style(inputs.pod_markers);

        let primary = if let Some(expires_at) = snapshot.expires_at {
            let reservoir = snapshot.reservoir.map(|reservoir| {
                let empty_portion = reservoir.empty_portion();
                let (amount, overfull_label) = match reservoir {
                    Reservoir::Overfull => {
                        (None, empty_portion <= OVERFULL_LABEL_MAX_PORTION)
                    }
                    Reservoir::Known(units) => (Some(format_units(units, concentration)), false),
                };
                PodReservoir {
                    amount,
                    gauge: PodGauge { empty_portion, overfull_label },
                    badge: badge_for(concentration, inputs.hide_insulin_badge),
                    clock_offset,
                }
            });
            Primary::Pod {
                reservoir,
                remaining: Remaining::until(expires_at, inputs.now),
            }
        } else if pod_style {
            Primary::NoPod
        } else if let Some(reservoir) = snapshot.reservoir {
            let amount = match reservoir {
                Reservoir::Overfull => Amount::Overfull,
                Reservoir::Known(units) => Amount::Units(format_units(units, concentration)),
            };
            Primary::Reservoir {
                badge: badge_for(concentration, inputs.hide_insulin_badge),
                amount,
            }
        } else {
            Primary::NoPump
        };

        let battery = match &snapshot.battery {
            Some(battery) if !pod_style => Some(BatteryIndicator {
                level: BatteryLevel::from_percent(battery.percent.unwrap_or(100)),
                severity: severity::battery_severity(Some(battery)),
                clock_offset,
            }),
            _ => None,
        };

        Self { primary, battery }
    }

    /// Groups of pieces, drawn with a space between groups
    pub fn groups(&self) -> Vec<Vec<Piece>> {
        let mut groups = Vec::new();

        match &self.primary {
            Primary::Pod { reservoir, remaining } => {
                if let Some(pod) = reservoir {
                    if let Some(amount) = &pod.amount {
                        groups.push(vec![
                            Piece::new(amount.clone(), Role::Value),
                            Piece::new("U", Role::Unit),
                        ]);
                    }

                    let mut gauge = Vec::new();
                    if let Some(badge) = &pod.badge {
                        gauge.push(Piece::new(badge.label(), Role::Badge));
                    }
                    gauge.push(Piece::new(pod.gauge.glyph(), Role::Gauge));
                    if pod.gauge.overfull_label {
                        gauge.push(Piece::new(OVERFULL_LABEL, Role::GaugeLabel));
                    }
                    if pod.clock_offset {
                        gauge.push(Piece::new(CLOCK_OFFSET_GLYPH, Role::ClockOffset));
                    }
                    groups.push(gauge);
                }
                groups.push(remaining_pieces(remaining));
            }
            Primary::NoPod => groups.push(vec![Piece::new("No Pod", Role::Placeholder)]),
            Primary::Reservoir { badge, amount } => {
                if let Some(badge) = badge {
                    groups.push(vec![Piece::new(badge.label(), Role::Badge)]);
                }
                groups.push(vec![
                    Piece::new(amount.text(), Role::Value),
                    Piece::new(" U", Role::Unit),
                ]);
            }
            Primary::NoPump => groups.push(vec![Piece::new("No Pump", Role::Placeholder)]),
        }

        if let Some(battery) = &self.battery {
            let mut pieces = vec![Piece::new(battery.level.glyph(), Role::Battery(battery.severity))];
            if battery.clock_offset {
                pieces.push(Piece::new(CLOCK_OFFSET_GLYPH, Role::ClockOffset));
            }
            groups.push(pieces);
        }

        groups
    }

    /// Unstyled single line, used for waybar and `--once`
    pub fn plain_text(&self) -> String {
        self.groups()
            .iter()
            .map(|group| group.iter().map(|p| p.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn remaining_pieces(remaining: &Remaining) -> Vec<Piece> {
    let unit_role = if remaining.is_urgent() { Role::UrgentUnit } else { Role::Unit };
    match remaining {
        Remaining::Replace => vec![Piece::new(remaining.text(), Role::Alert)],
        Remaining::Days { days, hours } => {
            let mut pieces = vec![
                Piece::new(days.to_string(), Role::Value),
                Piece::new("d", Role::Unit),
            ];
            if let Some(hours) = hours {
                pieces.push(Piece::new(format!(" {}", hours), Role::Value));
                pieces.push(Piece::new("h", Role::Unit));
            }
            pieces
        }
        Remaining::Hours { hours, .. } => vec![
            Piece::new(hours.to_string(), Role::Value),
            Piece::new("h", unit_role),
        ],
        Remaining::Minutes { minutes, .. } => vec![
            Piece::new(minutes.to_string(), Role::Value),
            Piece::new("m", unit_role),
        ],
    }
}
