//! Pump alert daemon
//!
//! Polls the pump snapshot and raises a desktop notification when the pod
//! expiry, reservoir or battery gets worse. Each alert fires once per
//! escalation; recovering resets it silently.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::interval;

use crate::config::AppConfig;
use crate::pump::{snapshot, PumpSnapshot, Reservoir, STANDARD_CONCENTRATION};
use crate::status::{format_units, severity, ConcentrationBadge, Remaining, Severity};

/// Severities of everything we alert on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertLevels {
    pub expiry: Severity,
    pub reservoir: Severity,
    pub battery: Severity,
}

impl Default for AlertLevels {
    fn default() -> Self {
        Self {
            expiry: Severity::Unknown,
            reservoir: Severity::Unknown,
            battery: Severity::Unknown,
        }
    }
}

impl AlertLevels {
    /// Pod batteries are not shown on the status line, so they never alert
    pub fn from_snapshot(snapshot: &PumpSnapshot, pod_markers: &[String], now: DateTime<Utc>) -> Self {
        let battery = if snapshot.is_pod_style(pod_markers) {
            Severity::Unknown
        } else {
            severity::battery_severity(snapshot.battery.as_ref())
        };
        Self {
            expiry: severity::expiry_severity(snapshot.expires_at, now),
            reservoir: severity::reservoir_severity(snapshot.reservoir),
            battery,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub summary: String,
    pub body: String,
    pub critical: bool,
}

/// Escalated to warning or critical since the last check
fn escalated(before: Severity, after: Severity) -> bool {
    after.needs_attention() && after.rank() > before.rank()
}

/// Compare two checks and build the alerts worth sending
pub fn alerts_between(
    before: &AlertLevels,
    after: &AlertLevels,
    snapshot: &PumpSnapshot,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if escalated(before.expiry, after.expiry) {
        if let Some(expires_at) = snapshot.expires_at {
            let body = match Remaining::until(expires_at, now) {
                Remaining::Replace => "Pod expired, replace it now".to_string(),
                left => format!("Pod expires in {}", left.text()),
            };
            alerts.push(Alert {
                summary: "Pod expiring".to_string(),
                body,
                critical: after.expiry == Severity::Critical,
            });
        }
    }

    if escalated(before.reservoir, after.reservoir) {
        if let Some(Reservoir::Known(units)) = snapshot.reservoir {
            // Thresholds are on the measured volume, so report that volume
            let concentration = snapshot.concentration();
            let mut body = format!("{} U left", format_units(units, STANDARD_CONCENTRATION));
            if concentration != STANDARD_CONCENTRATION {
                body.push_str(&format!(" ({})", ConcentrationBadge { concentration }.label()));
            }
            alerts.push(Alert {
                summary: "Reservoir low".to_string(),
                body,
                critical: after.reservoir == Severity::Critical,
            });
        }
    }

    if escalated(before.battery, after.battery) {
        if let Some(percent) = snapshot.battery.as_ref().and_then(|b| b.percent) {
            alerts.push(Alert {
                summary: "Pump battery low".to_string(),
                body: format!("{}% left", percent),
                critical: after.battery == Severity::Critical,
            });
        }
    }

    alerts
}

/// Start the alert loop
pub async fn start_monitoring(snapshot_override: Option<PathBuf>) -> Result<()> {
    let mut config = AppConfig::load()?;
    let mut check_interval = interval(Duration::from_secs(config.refresh_secs.max(1)));
    let mut last = AlertLevels::default();

    tracing::info!("Starting podbar daemon");

    loop {
        check_interval.tick().await;

        // Reload config to pick up changes
        if let Ok(new_config) = AppConfig::load() {
            config = new_config;
        }

        let path = snapshot_override
            .clone()
            .unwrap_or_else(|| config.snapshot_path());

        let snapshot = match snapshot::load(&path).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Monitoring cycle error: {}", e);
                continue;
            }
        };

        let now = Utc::now();
        let levels = AlertLevels::from_snapshot(&snapshot, &config.pod_markers, now);
        for alert in alerts_between(&last, &levels, &snapshot, now) {
            tracing::info!("{}: {}", alert.summary, alert.body);
            if config.notifications {
                if let Err(e) = notify(&alert) {
                    tracing::warn!("Failed to send notification: {}", e);
                }
            }
        }
        if levels != last {
            tracing::debug!("Alert levels changed: {:?} -> {:?}", last, levels);
        }
        last = levels;
    }
}

fn notify(alert: &Alert) -> Result<()> {
    let urgency = if alert.critical {
        notify_rust::Urgency::Critical
    } else {
        notify_rust::Urgency::Normal
    };
    notify_rust::Notification::new()
        .summary(&alert.summary)
        .body(&alert.body)
        .icon("dialog-warning")
        .urgency(urgency)
        .show()?;
    Ok(())
}
