//! Threshold helpers mapping pump values onto a severity

use chrono::{DateTime, TimeDelta, Utc};

use crate::pump::{Battery, Reservoir};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Critical,
    Warning,
    Good,
    Info,
    /// Value not available
    Unknown,
}

impl Severity {
    /// CSS class used in waybar output
    pub fn class(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Good => "good",
            Severity::Info => "info",
            Severity::Unknown => "unknown",
        }
    }

    /// How loudly this should be surfaced
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 3,
            Severity::Warning => 2,
            Severity::Good | Severity::Info => 1,
            Severity::Unknown => 0,
        }
    }

    pub fn needs_attention(&self) -> bool {
        matches!(self, Severity::Critical | Severity::Warning)
    }

    /// Most urgent of the given severities, `Unknown` for none
    pub fn worst(items: impl IntoIterator<Item = Severity>) -> Severity {
        items
            .into_iter()
            .max_by_key(|s| s.rank())
            .unwrap_or(Severity::Unknown)
    }
}

pub fn battery_severity(battery: Option<&Battery>) -> Severity {
    match battery.and_then(|b| b.percent) {
        None => Severity::Unknown,
        Some(p) if p <= 10 => Severity::Critical,
        Some(p) if p <= 20 => Severity::Warning,
        Some(_) => Severity::Good,
    }
}

pub fn reservoir_severity(reservoir: Option<Reservoir>) -> Severity {
    match reservoir {
        None => Severity::Unknown,
        Some(Reservoir::Overfull) => Severity::Info,
        Some(Reservoir::Known(units)) if units <= 10.0 => Severity::Critical,
        Some(Reservoir::Known(units)) if units <= 30.0 => Severity::Warning,
        Some(Reservoir::Known(_)) => Severity::Info,
    }
}

pub fn expiry_severity(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Severity {
    let Some(expires_at) = expires_at else {
        return Severity::Unknown;
    };
    let left = expires_at - now;
    if left <= TimeDelta::hours(8) {
        Severity::Critical
    } else if left <= TimeDelta::days(1) {
        Severity::Warning
    } else {
        Severity::Good
    }
}
