//! Settle delay between a guard becoming true and a popup becoming visible.
//!
//! The timer is a wall-clock deadline with no internal thread -- the caller
//! checks it through `tick()` on the sequencer. Dropping the timer before
//! the deadline is the cancellation path.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::PopupId;

/// Default settle delay, matching the landing screen's exit animation.
pub const DEFAULT_SETTLE_DELAY_MS: i64 = 500;

/// A scheduled "show popup" task.
///
/// Armed when the show-guard for `target` newly becomes true. The popup
/// only becomes visible if the deadline passes with the guard still true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleTimer {
    target: PopupId,
    armed_at: DateTime<Utc>,
    fires_at: DateTime<Utc>,
}

impl SettleTimer {
    pub fn arm(target: PopupId, now: DateTime<Utc>, delay_ms: i64) -> Self {
        Self {
            target,
            armed_at: now,
            fires_at: now + Duration::milliseconds(delay_ms),
        }
    }

    pub fn target(&self) -> PopupId {
        self.target
    }

    pub fn fires_at(&self) -> DateTime<Utc> {
        self.fires_at
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.fires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_due_before_deadline() {
        let now = Utc::now();
        let timer = SettleTimer::arm(PopupId::DailyGift, now, 500);
        assert!(!timer.is_due(now));
        assert!(!timer.is_due(now + Duration::milliseconds(499)));
    }

    #[test]
    fn due_at_and_after_deadline() {
        let now = Utc::now();
        let timer = SettleTimer::arm(PopupId::DailyGift, now, 500);
        assert!(timer.is_due(now + Duration::milliseconds(500)));
        assert!(timer.is_due(now + Duration::milliseconds(5000)));
    }

    #[test]
    fn zero_delay_fires_immediately() {
        let now = Utc::now();
        let timer = SettleTimer::arm(PopupId::AgeGate, now, 0);
        assert!(timer.is_due(now));
    }
}
