//! Personal rank-reward eligibility and claim.
//!
//! Eligible while the backend reports a pending reward the user has not
//! dismissed today. The payload is *captured* the first time it is seen
//! and kept for the whole session: the terminal branch re-checks it to
//! choose PersonalWinner over DailyWinners, and that choice must survive
//! the claim itself clearing the server-side pending state.

use chrono::{DateTime, NaiveDate, Utc};

use super::ActionResult;
use crate::backend::BackendClient;
use crate::error::{BackendError, ClaimError};
use crate::events::Event;
use crate::popup::{EligibilitySignal, PendingReward, PopupId};
use crate::storage::SeenStore;

#[derive(Debug)]
pub struct RankRewardProvider {
    user_id: Option<String>,
    generation: u64,
    signal: EligibilitySignal,
    /// Current server view of the pending reward.
    pending: Option<PendingReward>,
    /// First pending reward observed this session; never cleared.
    captured: Option<PendingReward>,
}

impl Default for RankRewardProvider {
    fn default() -> Self {
        Self {
            user_id: None,
            generation: 0,
            signal: EligibilitySignal::ineligible(),
            pending: None,
            captured: None,
        }
    }
}

impl RankRewardProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user(&mut self, user_id: Option<String>) {
        self.generation += 1;
        self.signal = if user_id.is_some() {
            EligibilitySignal::loading()
        } else {
            EligibilitySignal::ineligible()
        };
        self.pending = None;
        self.captured = None;
        self.user_id = user_id;
    }

    pub fn signal(&self) -> EligibilitySignal {
        self.signal
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The session-captured payload the terminal branch re-checks.
    pub fn captured(&self) -> Option<&PendingReward> {
        self.captured.as_ref()
    }

    pub fn resolve(
        &mut self,
        generation: u64,
        result: Result<Option<PendingReward>, BackendError>,
        store: &SeenStore,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Option<Event> {
        if generation != self.generation {
            return None;
        }
        let user = self.user_id.clone()?;
        match result {
            Ok(reward) => {
                if self.captured.is_none() {
                    self.captured = reward.clone();
                }
                // Store read failure counts as dismissed (fail-closed).
                let dismissed = store.reward_dismissed_today(&user, today).unwrap_or(true);
                self.signal = if reward.is_some() && !dismissed {
                    EligibilitySignal::eligible()
                } else {
                    EligibilitySignal::ineligible()
                };
                self.pending = reward;
                None
            }
            Err(e) => {
                self.signal = EligibilitySignal::ineligible();
                Some(Event::EligibilityFailed {
                    popup: PopupId::RankReward,
                    reason: e.to_string(),
                    at: now,
                })
            }
        }
    }

    /// Claim the pending reward. Must resolve before eligibility flips
    /// false: the signal is only changed once the backend has answered.
    pub async fn claim(&mut self, client: &BackendClient) -> Result<(), ClaimError> {
        let user = self.user_id.clone().ok_or(ClaimError::NothingToClaim)?;
        let reward = self.pending.clone().ok_or(ClaimError::NothingToClaim)?;
        let resp = client.claim_rank_reward(&user, &reward.reward_id).await?;
        if !resp.success {
            return Err(ClaimError::Rejected {
                reason: resp.message.unwrap_or_else(|| "claim refused".to_string()),
            });
        }
        self.pending = None;
        self.signal = EligibilitySignal::ineligible();
        Ok(())
    }

    /// Dismiss without claiming; persisted so the popup stays away for the
    /// rest of the day.
    pub fn dismiss(&mut self, store: &SeenStore, today: NaiveDate) -> ActionResult {
        self.signal = EligibilitySignal::ineligible();
        let Some(user) = self.user_id.as_deref() else {
            return Ok(None);
        };
        Ok(store.mark_reward_dismissed(user, today).err())
    }
}
