use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::popup::{PopupId, Stage};

/// Every decision the sequencer makes produces an Event.
/// The hosting screen polls for events; the CLI prints them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A show-guard newly became true; the settle timer was armed.
    SettleArmed {
        popup: PopupId,
        fires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// The guard flipped back (or the target changed) before the settle
    /// timer fired; no flash-then-hide.
    SettleCancelled {
        popup: PopupId,
        at: DateTime<Utc>,
    },
    PopupShown {
        popup: PopupId,
        at: DateTime<Utc>,
    },
    PopupClosed {
        popup: PopupId,
        /// Whether the close recorded a completion (a failed claim does not).
        completed: bool,
        at: DateTime<Utc>,
    },
    ClaimSucceeded {
        popup: PopupId,
        at: DateTime<Utc>,
    },
    /// Surfaced to the user as a transient notification; the popup stays
    /// open and retryable. The sequencer never auto-retries.
    ClaimFailed {
        popup: PopupId,
        reason: String,
        at: DateTime<Utc>,
    },
    /// An eligibility fetch failed; the provider resolved fail-closed.
    EligibilityFailed {
        popup: PopupId,
        reason: String,
        at: DateTime<Utc>,
    },
    /// A seen/claimed marker write failed. The popup still closed locally;
    /// it may reappear on a later evaluation.
    MarkerWriteFailed {
        popup: PopupId,
        reason: String,
        at: DateTime<Utc>,
    },
    /// The sequence reached its end; nothing further will be shown.
    SequenceCompleted {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        stage: Stage,
        active: Option<PopupId>,
        settle_pending: Option<PopupId>,
        at: DateTime<Utc>,
    },
}
