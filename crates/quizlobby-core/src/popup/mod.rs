//! Popup identity, eligibility signals, and the priority sequencer.

pub mod bypass;
pub mod sequencer;
pub mod settle;
pub mod signal;

pub use bypass::{DiagnosticBypass, NoBypass, TerminalGateBypass};
pub use sequencer::{CloseOutcome, CompletedFlags, PopupSequencer, Stage};
pub use settle::SettleTimer;
pub use signal::{EligibilitySignal, PendingReward, SignalSet};

use serde::{Deserialize, Serialize};

/// Identifier for each modal popup the landing screen can host.
///
/// Declaration order is the fixed priority order. `PersonalWinner` and
/// `DailyWinners` share the terminal slot and are mutually exclusive
/// within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupId {
    AgeGate,
    RankReward,
    WelcomeBonus,
    DailyGift,
    PersonalWinner,
    DailyWinners,
}

impl PopupId {
    /// Position in the fixed priority order (lower shows first).
    /// The two terminal popups share a rank.
    pub fn priority(self) -> u8 {
        match self {
            PopupId::AgeGate => 0,
            PopupId::RankReward => 1,
            PopupId::WelcomeBonus => 2,
            PopupId::DailyGift => 3,
            PopupId::PersonalWinner | PopupId::DailyWinners => 4,
        }
    }

    /// Gating popups record a completion before the sequence may pass them.
    pub fn is_gating(self) -> bool {
        matches!(
            self,
            PopupId::AgeGate | PopupId::WelcomeBonus | PopupId::DailyGift
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PopupId::AgeGate => "age_gate",
            PopupId::RankReward => "rank_reward",
            PopupId::WelcomeBonus => "welcome_bonus",
            PopupId::DailyGift => "daily_gift",
            PopupId::PersonalWinner => "personal_winner",
            PopupId::DailyWinners => "daily_winners",
        }
    }
}

impl std::fmt::Display for PopupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
