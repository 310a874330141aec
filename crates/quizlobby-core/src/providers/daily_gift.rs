//! Daily gift eligibility and claim.
//!
//! Once per calendar day: the claim marker carries the day it was written
//! for, so eligibility returns naturally at midnight without any reset
//! job. Dismissal is session-local.

use chrono::{DateTime, NaiveDate, Utc};

use super::ActionResult;
use crate::backend::BackendClient;
use crate::error::{BackendError, ClaimError};
use crate::events::Event;
use crate::popup::{EligibilitySignal, PopupId};
use crate::storage::SeenStore;

#[derive(Debug)]
pub struct DailyGiftProvider {
    user_id: Option<String>,
    generation: u64,
    signal: EligibilitySignal,
}

impl Default for DailyGiftProvider {
    fn default() -> Self {
        Self {
            user_id: None,
            generation: 0,
            signal: EligibilitySignal::ineligible(),
        }
    }
}

impl DailyGiftProvider {
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
        self.user_id = user_id;
    }

    pub fn signal(&self) -> EligibilitySignal {
        self.signal
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn resolve(
        &mut self,
        generation: u64,
        result: Result<bool, BackendError>,
        store: &SeenStore,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Option<Event> {
        if generation != self.generation {
            return None;
        }
        let user = self.user_id.clone()?;
        match result {
            Ok(can_claim) => {
                let claimed = store.gift_claimed_today(&user, today).unwrap_or(true);
                self.signal = if can_claim && !claimed {
                    EligibilitySignal::eligible()
                } else {
                    EligibilitySignal::ineligible()
                };
                None
            }
            Err(e) => {
                self.signal = EligibilitySignal::ineligible();
                Some(Event::EligibilityFailed {
                    popup: PopupId::DailyGift,
                    reason: e.to_string(),
                    at: now,
                })
            }
        }
    }

    /// Claim today's gift on the server, then record the day marker.
    pub async fn claim(
        &mut self,
        client: &BackendClient,
        store: &SeenStore,
        today: NaiveDate,
    ) -> ActionResult {
        let user = self.user_id.clone().ok_or(ClaimError::NothingToClaim)?;
        let resp = client.claim_daily_gift(&user).await?;
        if !resp.success {
            return Err(ClaimError::Rejected {
                reason: resp.message.unwrap_or_else(|| "claim refused".to_string()),
            });
        }
        self.signal = EligibilitySignal::ineligible();
        Ok(store.mark_gift_claimed(&user, today).err())
    }

    /// Session-local dismissal; the gift stays claimable tomorrow (and on
    /// re-login today).
    pub fn dismiss(&mut self) {
        self.signal = EligibilitySignal::ineligible();
    }
}
