//! Seen/claimed marker storage.
//!
//! Records, per user, which popups were already claimed or shown and when.
//! Providers consult these markers when resolving eligibility, so a popup
//! whose marker is present naturally reports ineligible -- the sequencer
//! never reads this store directly.
//!
//! Markers live in a TOML file at `~/.config/quizlobby/seen.toml`, keyed
//! by user id; day-scoped markers store the calendar day they apply to.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::StoreError;

/// Marker storage for one installation.
pub struct SeenStore {
    path: PathBuf,
}

/// Wrapper for serializing markers to TOML.
#[derive(Debug, Default, Serialize, Deserialize)]
struct MarkersFile {
    #[serde(default)]
    users: HashMap<String, UserMarkers>,
}

/// Per-user markers. One-shot markers are plain booleans; day-scoped
/// markers keep the day they were written for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMarkers {
    #[serde(default)]
    pub age_confirmed: bool,
    #[serde(default)]
    pub welcome_claimed: bool,
    #[serde(default)]
    pub gift_claimed_on: Option<NaiveDate>,
    #[serde(default)]
    pub winners_shown_on: Option<NaiveDate>,
    #[serde(default)]
    pub reward_dismissed_on: Option<NaiveDate>,
}

impl SeenStore {
    /// Open the store at the default location.
    pub fn open() -> Result<Self, StoreError> {
        Ok(Self {
            path: data_dir()?.join("seen.toml"),
        })
    }

    /// Create a store with a custom path (tests, alternate installs).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Markers for one user; absent users have no markers.
    pub fn markers(&self, user_id: &str) -> Result<UserMarkers, StoreError> {
        Ok(self
            .load()?
            .users
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    // ── One-shot markers ─────────────────────────────────────────────

    pub fn age_confirmed(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.markers(user_id)?.age_confirmed)
    }

    pub fn mark_age_confirmed(&self, user_id: &str) -> Result<(), StoreError> {
        self.update(user_id, |m| m.age_confirmed = true)
    }

    pub fn welcome_claimed(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.markers(user_id)?.welcome_claimed)
    }

    pub fn mark_welcome_claimed(&self, user_id: &str) -> Result<(), StoreError> {
        self.update(user_id, |m| m.welcome_claimed = true)
    }

    // ── Day-scoped markers ───────────────────────────────────────────

    pub fn gift_claimed_today(&self, user_id: &str, today: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.markers(user_id)?.gift_claimed_on == Some(today))
    }

    pub fn mark_gift_claimed(&self, user_id: &str, day: NaiveDate) -> Result<(), StoreError> {
        self.update(user_id, |m| m.gift_claimed_on = Some(day))
    }

    pub fn winners_shown_today(&self, user_id: &str, today: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.markers(user_id)?.winners_shown_on == Some(today))
    }

    pub fn mark_winners_shown(&self, user_id: &str, day: NaiveDate) -> Result<(), StoreError> {
        self.update(user_id, |m| m.winners_shown_on = Some(day))
    }

    pub fn reward_dismissed_today(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<bool, StoreError> {
        Ok(self.markers(user_id)?.reward_dismissed_on == Some(today))
    }

    pub fn mark_reward_dismissed(&self, user_id: &str, day: NaiveDate) -> Result<(), StoreError> {
        self.update(user_id, |m| m.reward_dismissed_on = Some(day))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn load(&self) -> Result<MarkersFile, StoreError> {
        if !self.path.exists() {
            return Ok(MarkersFile::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| StoreError::LoadFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| StoreError::LoadFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn update(
        &self,
        user_id: &str,
        mutate: impl FnOnce(&mut UserMarkers),
    ) -> Result<(), StoreError> {
        let mut file = self.load()?;
        mutate(file.users.entry(user_id.to_string()).or_default());
        let content = toml::to_string_pretty(&file).map_err(|e| StoreError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, content).map_err(|e| StoreError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}
