//! Daily winners announcement eligibility.
//!
//! Eligible when today's winners have been announced and the announcement
//! has not been shown on this install today. Closing persists the
//! shown-today marker; there is no claim.

use chrono::{DateTime, NaiveDate, Utc};

use super::ActionResult;
use crate::error::BackendError;
use crate::events::Event;
use crate::popup::{EligibilitySignal, PopupId};
use crate::storage::SeenStore;

#[derive(Debug)]
pub struct DailyWinnersProvider {
    user_id: Option<String>,
    generation: u64,
    signal: EligibilitySignal,
}

impl Default for DailyWinnersProvider {
    fn default() -> Self {
        Self {
            user_id: None,
            generation: 0,
            signal: EligibilitySignal::ineligible(),
        }
    }
}

impl DailyWinnersProvider {
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
            Ok(can_show) => {
                let shown = store.winners_shown_today(&user, today).unwrap_or(true);
                self.signal = if can_show && !shown {
                    EligibilitySignal::eligible()
                } else {
                    EligibilitySignal::ineligible()
                };
                None
            }
            Err(e) => {
                self.signal = EligibilitySignal::ineligible();
                Some(Event::EligibilityFailed {
                    popup: PopupId::DailyWinners,
                    reason: e.to_string(),
                    at: now,
                })
            }
        }
    }

    /// Close the announcement, persisting the shown-today marker so
    /// eligibility naturally reports false afterward.
    pub fn close(&mut self, store: &SeenStore, today: NaiveDate) -> ActionResult {
        self.signal = EligibilitySignal::ineligible();
        let Some(user) = self.user_id.as_deref() else {
            return Ok(None);
        };
        Ok(store.mark_winners_shown(user, today).err())
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
    fn announced_and_unseen_is_eligible() {
        let (_dir, store) = temp_store();
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let mut provider = DailyWinnersProvider::new();
        provider.set_user(Some("u1".into()));
        let generation = provider.generation();
        provider.resolve(generation, Ok(true), &store, today, Utc::now());
        assert!(provider.signal().is_eligible);
    }

    #[test]
    fn close_writes_marker_and_kills_eligibility() {
        let (_dir, store) = temp_store();
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let mut provider = DailyWinnersProvider::new();
        provider.set_user(Some("u1".into()));
        let generation = provider.generation();
        provider.resolve(generation, Ok(true), &store, today, Utc::now());

        assert!(matches!(provider.close(&store, today), Ok(None)));
        assert!(!provider.signal().is_eligible);

        // A later refresh stays ineligible because of the marker.
        provider.resolve(generation, Ok(true), &store, today, Utc::now());
        assert!(!provider.signal().is_eligible);
    }

    #[test]
    fn marker_write_failure_still_kills_eligibility() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory missing: the marker write fails.
        let store = SeenStore::with_path(dir.path().join("missing").join("seen.toml"));
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let mut provider = DailyWinnersProvider::new();
        provider.set_user(Some("u1".into()));
        let generation = provider.generation();
        provider.resolve(generation, Ok(true), &store, today, Utc::now());
        assert!(provider.signal().is_eligible);

        // The close succeeds locally and reports the store error.
        assert!(matches!(provider.close(&store, today), Ok(Some(_))));
        assert!(!provider.signal().is_eligible);
    }
}
