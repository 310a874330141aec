//! Welcome bonus eligibility and claim.
//!
//! Once per account: the claim is recorded both server-side and as a local
//! marker. Dismissal is session-local only -- declining the bonus today
//! leaves it available on the next login.

use chrono::{DateTime, Utc};

use super::ActionResult;
use crate::backend::BackendClient;
use crate::error::{BackendError, ClaimError};
use crate::events::Event;
use crate::popup::{EligibilitySignal, PopupId};
use crate::storage::SeenStore;

#[derive(Debug)]
pub struct WelcomeBonusProvider {
    user_id: Option<String>,
    generation: u64,
    signal: EligibilitySignal,
}

impl Default for WelcomeBonusProvider {
    fn default() -> Self {
        Self {
            user_id: None,
            generation: 0,
            signal: EligibilitySignal::ineligible(),
        }
    }
}

impl WelcomeBonusProvider {
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
        now: DateTime<Utc>,
    ) -> Option<Event> {
        if generation != self.generation {
            return None;
        }
        let user = self.user_id.clone()?;
        match result {
            Ok(can_claim) => {
                let claimed = store.welcome_claimed(&user).unwrap_or(true);
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
                    popup: PopupId::WelcomeBonus,
                    reason: e.to_string(),
                    at: now,
                })
            }
        }
    }

    /// Claim the bonus on the server, then record the local marker.
    pub async fn claim(&mut self, client: &BackendClient, store: &SeenStore) -> ActionResult {
        let user = self.user_id.clone().ok_or(ClaimError::NothingToClaim)?;
        let resp = client.claim_welcome_bonus(&user).await?;
        if !resp.success {
            return Err(ClaimError::Rejected {
                reason: resp.message.unwrap_or_else(|| "claim refused".to_string()),
            });
        }
        self.signal = EligibilitySignal::ineligible();
        Ok(store.mark_welcome_claimed(&user).err())
    }

    /// Session-local dismissal; nothing is persisted.
    pub fn dismiss(&mut self) {
        self.signal = EligibilitySignal::ineligible();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, SeenStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SeenStore::with_path(dir.path().join("seen.toml"));
        (dir, store)
    }

    #[test]
    fn claimable_bonus_is_eligible() {
        let (_dir, store) = temp_store();
        let mut provider = WelcomeBonusProvider::new();
        provider.set_user(Some("u1".into()));
        let generation = provider.generation();
        provider.resolve(generation, Ok(true), &store, Utc::now());
        assert!(provider.signal().is_eligible);
    }

    #[test]
    fn local_marker_overrides_backend() {
        let (_dir, store) = temp_store();
        store.mark_welcome_claimed("u1").unwrap();
        let mut provider = WelcomeBonusProvider::new();
        provider.set_user(Some("u1".into()));
        let generation = provider.generation();
        provider.resolve(generation, Ok(true), &store, Utc::now());
        assert!(!provider.signal().is_eligible);
    }

    #[test]
    fn dismiss_is_session_local() {
        let (_dir, store) = temp_store();
        let mut provider = WelcomeBonusProvider::new();
        provider.set_user(Some("u1".into()));
        let generation = provider.generation();
        provider.resolve(generation, Ok(true), &store, Utc::now());
        provider.dismiss();
        assert!(!provider.signal().is_eligible);
        // No marker was written.
        assert!(!store.welcome_claimed("u1").unwrap());
    }
}
