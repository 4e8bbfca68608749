//! Pump state as handed to us by the loop app
//!
//! Nothing here talks to a pump. The snapshot is produced elsewhere and we
//! only read it back, so every field is optional and absence is normal.

pub mod snapshot;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Raw reservoir value pumps report when the pod holds more than it can measure
pub const OVERFULL_SENTINEL: u64 = 0xDEAD_BEEF;

/// Standard U-100 insulin
pub const STANDARD_CONCENTRATION: f64 = 1.0;

/// Remaining insulin in the reservoir
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub enum Reservoir {
    /// Measured volume in units
    Known(f64),
    /// Above the measurable range, shown as "50+"
    Overfull,
}

impl From<f64> for Reservoir {
    fn from(raw: f64) -> Self {
        if raw == OVERFULL_SENTINEL as f64 {
            Reservoir::Overfull
        } else {
            Reservoir::Known(raw)
        }
    }
}

impl From<Reservoir> for f64 {
    fn from(reservoir: Reservoir) -> Self {
        match reservoir {
            Reservoir::Known(units) => units,
            Reservoir::Overfull => OVERFULL_SENTINEL as f64,
        }
    }
}

impl Reservoir {
    /// Measured units, `None` when overfull
    pub fn units(&self) -> Option<f64> {
        match self {
            Reservoir::Known(units) => Some(*units),
            Reservoir::Overfull => None,
        }
    }

    /// Empty share of the pod reservoir drawing, 0.0 is full and 1.0 is empty.
    ///
    /// The pod reservoir is not rectangular, so volume maps to height through
    /// a 1.2 factor, and the bottom inserter hides roughly 10 U.
    pub fn empty_portion(&self) -> f64 {
        match self {
            Reservoir::Known(units) => (1.0 - (units + 10.0) * 1.2 / 200.0).clamp(0.0, 1.0),
            Reservoir::Overfull => 0.0,
        }
    }
}

/// Pump battery as reported by tubed pumps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
}

/// One entry of the insulin concentration history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsulinConcentration {
    pub date: DateTime<Utc>,
    pub concentration: f64,
}

/// Most recent usable concentration, defaulting to U-100
pub fn latest_concentration(records: &[InsulinConcentration]) -> f64 {
    records
        .iter()
        .filter(|r| r.concentration.is_finite() && r.concentration > 0.0)
        .max_by_key(|r| r.date)
        .map(|r| r.concentration)
        .unwrap_or(STANDARD_CONCENTRATION)
}

/// Everything the status line reads about the pump
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PumpSnapshot {
    /// Display name, e.g. "Omnipod DASH" or "Dana-i"
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservoir: Option<Reservoir>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<Battery>,

    /// Only pods expire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Pump clock offset from UTC in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_secs: Option<i32>,

    #[serde(default)]
    pub concentrations: Vec<InsulinConcentration>,
}

impl PumpSnapshot {
    /// Pump timezone, ignoring offsets chrono can't represent
    pub fn timezone(&self) -> Option<FixedOffset> {
        self.utc_offset_secs.and_then(FixedOffset::east_opt)
    }

    pub fn concentration(&self) -> f64 {
        latest_concentration(&self.concentrations)
    }

    /// Whether the pump name marks it as a tubeless pod
    pub fn is_pod_style(&self, markers: &[String]) -> bool {
        markers
            .iter()
            .any(|m| !m.is_empty() && self.name.contains(m.as_str()))
    }
}
