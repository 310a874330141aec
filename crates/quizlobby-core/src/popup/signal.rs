//! Eligibility signals fed to the sequencer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Latest known eligibility of one provider.
///
/// The initial value is *loading*: indeterminate blocks the sequence, it
/// never counts as ineligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilitySignal {
    pub is_eligible: bool,
    pub is_loading: bool,
}

impl EligibilitySignal {
    /// Fetch in flight (or not yet started). Blocks the sequence.
    pub fn loading() -> Self {
        Self {
            is_eligible: false,
            is_loading: true,
        }
    }

    pub fn eligible() -> Self {
        Self {
            is_eligible: true,
            is_loading: false,
        }
    }

    pub fn ineligible() -> Self {
        Self {
            is_eligible: false,
            is_loading: false,
        }
    }

    pub fn resolved(&self) -> bool {
        !self.is_loading
    }
}

impl Default for EligibilitySignal {
    fn default() -> Self {
        Self::loading()
    }
}

/// Rank-reward payload. Captured when the rank-reward check first resolves
/// and re-checked at the terminal branch, so it stays valid across the
/// whole sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReward {
    pub reward_id: String,
    pub rank: u32,
    pub amount: u64,
    /// Day of the contest the reward was earned in.
    pub awarded_on: NaiveDate,
}

/// Snapshot of all five provider signals, rebuilt for every sequencer
/// evaluation. The sequencer reads this; it never writes provider state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSet {
    pub age_gate: EligibilitySignal,
    pub rank_reward: EligibilitySignal,
    pub welcome_bonus: EligibilitySignal,
    pub daily_gift: EligibilitySignal,
    pub daily_winners: EligibilitySignal,
    /// Captured rank-reward payload for the terminal branch.
    pub pending_reward: Option<PendingReward>,
}

impl SignalSet {
    /// True once every provider has resolved at least once.
    pub fn all_resolved(&self) -> bool {
        self.age_gate.resolved()
            && self.rank_reward.resolved()
            && self.welcome_bonus.resolved()
            && self.daily_gift.resolved()
            && self.daily_winners.resolved()
    }
}
