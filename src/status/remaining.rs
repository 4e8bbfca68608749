//! Time left until the pod has to be replaced

use chrono::{DateTime, TimeDelta, Utc};

/// Below this the hour and minute units turn red
const URGENT_WITHIN_SECS: i64 = 4 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    /// Pod expired
    Replace,
    /// `hours` is what is left after whole days
    Days { days: i64, hours: Option<i64> },
    Hours { hours: i64, urgent: bool },
    Minutes { minutes: i64, urgent: bool },
}

impl Remaining {
    pub fn until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::from_delta(expires_at - now)
    }

    /// Pick the coarsest non-zero unit, truncating
    pub fn from_delta(left: TimeDelta) -> Self {
        if left <= TimeDelta::zero() {
            return Remaining::Replace;
        }

        let secs = left.num_seconds();
        let days = left.num_days();
        let hours = left.num_hours();
        let minutes = left.num_minutes();
        let urgent = secs < URGENT_WITHIN_SECS;

        if days >= 1 {
            let adjusted = hours - days * 24;
            Remaining::Days {
                days,
                hours: (adjusted >= 0).then_some(adjusted),
            }
        } else if hours >= 1 {
            Remaining::Hours { hours, urgent }
        } else {
            Remaining::Minutes { minutes, urgent }
        }
    }

    /// True when the unit should be drawn in the alert color
    pub fn is_urgent(&self) -> bool {
        match self {
            Remaining::Replace => true,
            Remaining::Days { .. } => false,
            Remaining::Hours { urgent, .. } | Remaining::Minutes { urgent, .. } => *urgent,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Remaining::Replace => "Replace".to_string(),
            Remaining::Days { days, hours: Some(h) } => format!("{}d {}h", days, h),
            Remaining::Days { days, hours: None } => format!("{}d", days),
            Remaining::Hours { hours, .. } => format!("{}h", hours),
            Remaining::Minutes { minutes, .. } => format!("{}m", minutes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: i64) -> Remaining {
        Remaining::from_delta(TimeDelta::seconds(s))
    }

    #[test]
    fn test_expired_pod_needs_replacing() {
        assert_eq!(secs(0), Remaining::Replace);
        assert_eq!(secs(-3600), Remaining::Replace);
        assert_eq!(secs(0).text(), "Replace");
        assert!(secs(0).is_urgent());
    }

    #[test]
    fn test_days_with_remainder_hours() {
        let r = secs(90_000);
        assert_eq!(r, Remaining::Days { days: 1, hours: Some(1) });
        assert_eq!(r.text(), "1d 1h");
        assert!(!r.is_urgent());

        assert_eq!(secs(3 * 86_400).text(), "3d 0h");
    }

    #[test]
    fn test_hours_below_four_are_urgent() {
        let r = secs(10_000);
        assert_eq!(r, Remaining::Hours { hours: 2, urgent: true });
        assert_eq!(r.text(), "2h");

        let r = secs(5 * 3600);
        assert_eq!(r, Remaining::Hours { hours: 5, urgent: false });
    }

    #[test]
    fn test_minutes() {
        let r = secs(3000);
        assert_eq!(r, Remaining::Minutes { minutes: 50, urgent: true });
        assert_eq!(r.text(), "50m");
        assert!(r.is_urgent());

        assert_eq!(secs(59).text(), "0m");
    }

    #[test]
    fn test_sub_second_is_not_expired() {
        let r = Remaining::from_delta(TimeDelta::milliseconds(500));
        assert_eq!(r, Remaining::Minutes { minutes: 0, urgent: true });
    }
}
