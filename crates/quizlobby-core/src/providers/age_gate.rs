//! Age verification eligibility.
//!
//! Eligible when the backend says the profile still needs verification and
//! the user has not already confirmed on this install. Confirmation is a
//! local acknowledgement recorded through the store; there is no server
//! claim.

use chrono::{DateTime, Utc};

use crate::backend::AgeStatus;
use crate::error::{BackendError, StoreError};
use crate::events::Event;
use crate::popup::{EligibilitySignal, PopupId};
use crate::storage::SeenStore;

#[derive(Debug)]
pub struct AgeGateProvider {
    user_id: Option<String>,
    generation: u64,
    signal: EligibilitySignal,
}

impl Default for AgeGateProvider {
    fn default() -> Self {
        Self {
            user_id: None,
            generation: 0,
            // No user: nothing to wait for.
            signal: EligibilitySignal::ineligible(),
        }
    }
}

impl AgeGateProvider {
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

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn signal(&self) -> EligibilitySignal {
        self.signal
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply a fetch result started at `generation`. Stale results are
    /// discarded; fetch failures resolve fail-closed.
    pub fn resolve(
        &mut self,
        generation: u64,
        result: Result<AgeStatus, BackendError>,
        store: &SeenStore,
        now: DateTime<Utc>,
    ) -> Option<Event> {
        if generation != self.generation {
            return None;
        }
        let user = self.user_id.clone()?;
        match result {
            Ok(status) => {
                // A store read failure counts as already confirmed.
                let confirmed = store.age_confirmed(&user).unwrap_or(true);
                self.signal = if status.needs_verification && !confirmed {
                    EligibilitySignal::eligible()
                } else {
                    EligibilitySignal::ineligible()
                };
                None
            }
            Err(e) => {
                self.signal = EligibilitySignal::ineligible();
                Some(Event::EligibilityFailed {
                    popup: PopupId::AgeGate,
                    reason: e.to_string(),
                    at: now,
                })
            }
        }
    }

    /// Record the user's confirmation. Local-only; the marker write may
    /// fail, in which case the caller closes optimistically.
    pub fn confirm(&mut self, store: &SeenStore) -> Option<StoreError> {
        self.signal = EligibilitySignal::ineligible();
        let user = self.user_id.as_deref()?;
        store.mark_age_confirmed(user).err()
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
    fn loading_until_first_resolve() {
        let mut provider = AgeGateProvider::new();
        provider.set_user(Some("u1".into()));
        assert!(provider.signal().is_loading);
    }

    #[test]
    fn needs_verification_makes_eligible() {
        let (_dir, store) = temp_store();
        let mut provider = AgeGateProvider::new();
        provider.set_user(Some("u1".into()));
        let generation = provider.generation();
        let event = provider.resolve(
            generation,
            Ok(AgeStatus {
                needs_verification: true,
            }),
            &store,
            Utc::now(),
        );
        assert!(event.is_none());
        assert!(provider.signal().is_eligible);
    }

    #[test]
    fn fetch_failure_resolves_fail_closed() {
        let (_dir, store) = temp_store();
        let mut provider = AgeGateProvider::new();
        provider.set_user(Some("u1".into()));
        let generation = provider.generation();
        let event = provider.resolve(
            generation,
            Err(BackendError::Status {
                endpoint: "users/u1/age-status".into(),
                status: 500,
            }),
            &store,
            Utc::now(),
        );
        assert!(matches!(event, Some(Event::EligibilityFailed { .. })));
        assert_eq!(provider.signal(), EligibilitySignal::ineligible());
    }

    #[test]
    fn stale_resolve_is_discarded() {
        let (_dir, store) = temp_store();
        let mut provider = AgeGateProvider::new();
        provider.set_user(Some("u1".into()));
        let stale = provider.generation();
        provider.set_user(Some("u2".into()));
        provider.resolve(
            stale,
            Ok(AgeStatus {
                needs_verification: true,
            }),
            &store,
            Utc::now(),
        );
        // Still loading for u2; u1's answer never landed.
        assert!(provider.signal().is_loading);
    }

    #[test]
    fn confirmation_persists_across_refreshes() {
        let (_dir, store) = temp_store();
        let mut provider = AgeGateProvider::new();
        provider.set_user(Some("u1".into()));
        assert!(provider.confirm(&store).is_none());
        assert!(!provider.signal().is_eligible);

        // Backend still wants verification, but the local marker wins.
        let generation = provider.generation();
        provider.resolve(
            generation,
            Ok(AgeStatus {
                needs_verification: true,
            }),
            &store,
            Utc::now(),
        );
        assert!(!provider.signal().is_eligible);
    }
}
