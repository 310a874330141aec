//! Eligibility providers, one per popup.
//!
//! Each provider owns exactly three things: the latest eligibility signal
//! for its popup, the payload that signal was derived from, and its own
//! seen/claimed markers in the external store. Providers never touch
//! sequencer state; the sequencer only ever reads their signals through a
//! `SignalSet` snapshot.
//!
//! Refreshes are generation-counted: a fetch started under generation *g*
//! is discarded on arrival if the generation has moved on (user switched or
//! the screen unmounted mid-flight), so stale responses never land.

pub mod age_gate;
pub mod daily_gift;
pub mod daily_winners;
pub mod rank_reward;
pub mod welcome_bonus;

pub use age_gate::AgeGateProvider;
pub use daily_gift::DailyGiftProvider;
pub use daily_winners::DailyWinnersProvider;
pub use rank_reward::RankRewardProvider;
pub use welcome_bonus::WelcomeBonusProvider;

use crate::error::{ClaimError, StoreError};
use crate::popup::SignalSet;

/// Result of a provider action with a server or store side effect.
///
/// `Ok(None)`: action fully persisted. `Ok(Some(err))`: the action
/// succeeded but the marker write failed -- the popup still closes
/// (optimistic) and may reappear on a later evaluation. `Err`: the server
/// claim failed; nothing was recorded.
pub type ActionResult = Result<Option<StoreError>, ClaimError>;

/// All five providers for one user session.
#[derive(Debug, Default)]
pub struct Providers {
    pub age_gate: AgeGateProvider,
    pub rank_reward: RankRewardProvider,
    pub welcome_bonus: WelcomeBonusProvider,
    pub daily_gift: DailyGiftProvider,
    pub daily_winners: DailyWinnersProvider,
}

impl Providers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point every provider at a new owning user (or none). Bumps each
    /// generation so in-flight fetches for the old user are discarded.
    pub fn set_user(&mut self, user_id: Option<&str>) {
        self.age_gate.set_user(user_id.map(String::from));
        self.rank_reward.set_user(user_id.map(String::from));
        self.welcome_bonus.set_user(user_id.map(String::from));
        self.daily_gift.set_user(user_id.map(String::from));
        self.daily_winners.set_user(user_id.map(String::from));
    }

    /// Assemble the read-only snapshot the sequencer consumes.
    pub fn signal_set(&self) -> SignalSet {
        SignalSet {
            age_gate: self.age_gate.signal(),
            rank_reward: self.rank_reward.signal(),
            welcome_bonus: self.welcome_bonus.signal(),
            daily_gift: self.daily_gift.signal(),
            daily_winners: self.daily_winners.signal(),
            pending_reward: self.rank_reward.captured().cloned(),
        }
    }
}
