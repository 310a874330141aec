//! Per-login session wiring.
//!
//! A `Session` owns the five providers, the sequencer, the backend client,
//! and the marker store for one authenticated user. It is the only place
//! that performs I/O on the sequencer's behalf: claims are awaited here,
//! then reported to the sequencer through `close_active`.
//!
//! Lifecycle: created when a user session becomes available, dropped on
//! logout/unmount. `end()` bumps provider generations so fetches still in
//! flight at teardown are discarded instead of landing in stale state.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::BackendClient;
use crate::error::{CoreError, StoreError};
use crate::events::Event;
use crate::popup::{
    CloseOutcome, DiagnosticBypass, NoBypass, PopupId, PopupSequencer, SignalSet, Stage,
    TerminalGateBypass,
};
use crate::providers::Providers;
use crate::storage::{Config, SeenStore};

pub struct Session {
    id: Uuid,
    user_id: String,
    providers: Providers,
    sequencer: PopupSequencer,
    client: BackendClient,
    store: SeenStore,
}

impl Session {
    pub fn new(user_id: &str, config: &Config) -> Result<Self, CoreError> {
        let client = BackendClient::new(&config.backend_url)?;
        let store = SeenStore::open()?;
        Ok(Self::with_parts(user_id, config, client, store))
    }

    /// Wire a session from explicit parts (tests, alternate stores).
    pub fn with_parts(
        user_id: &str,
        config: &Config,
        client: BackendClient,
        store: SeenStore,
    ) -> Self {
        let mut providers = Providers::new();
        providers.set_user(Some(user_id));
        let bypass: Box<dyn TerminalGateBypass> = match &config.diagnostic_user {
            Some(diag) => Box::new(DiagnosticBypass::new(diag.clone())),
            None => Box::new(NoBypass),
        };
        let sequencer = PopupSequencer::new(user_id)
            .with_settle_delay_ms(config.settle_delay_ms)
            .with_bypass(bypass);
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            providers,
            sequencer,
            client,
            store,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn active(&self) -> Option<PopupId> {
        self.sequencer.active()
    }

    pub fn stage(&self) -> Stage {
        self.sequencer.stage()
    }

    /// Popup whose settle timer is armed, if any.
    pub fn settle_pending(&self) -> Option<PopupId> {
        self.sequencer.settle_pending()
    }

    pub fn signals(&self) -> SignalSet {
        self.providers.signal_set()
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        self.sequencer.snapshot(now)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// The hosting screen became ready (or unready) to mount modals.
    pub fn screen_ready(&mut self, ready: bool, now: DateTime<Utc>) -> Vec<Event> {
        let signals = self.providers.signal_set();
        self.sequencer.set_screen_ready(ready, &signals, now)
    }

    /// Run all five eligibility checks concurrently, land whichever
    /// results are still current, then re-evaluate the sequence.
    pub async fn refresh(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let today = now.date_naive();
        let user = self.user_id.clone();
        let mut events = Vec::new();

        let age_gen = self.providers.age_gate.generation();
        let rank_gen = self.providers.rank_reward.generation();
        let welcome_gen = self.providers.welcome_bonus.generation();
        let gift_gen = self.providers.daily_gift.generation();
        let winners_gen = self.providers.daily_winners.generation();

        let (age, rank, welcome, gift, winners) = tokio::join!(
            self.client.age_status(&user),
            self.client.pending_rank_reward(&user),
            self.client.welcome_bonus_available(&user),
            self.client.daily_gift_available(&user),
            self.client.winners_announced_today(&user),
        );

        events.extend(
            self.providers
                .age_gate
                .resolve(age_gen, age, &self.store, now),
        );
        events.extend(
            self.providers
                .rank_reward
                .resolve(rank_gen, rank, &self.store, today, now),
        );
        events.extend(
            self.providers
                .welcome_bonus
                .resolve(welcome_gen, welcome, &self.store, now),
        );
        events.extend(
            self.providers
                .daily_gift
                .resolve(gift_gen, gift, &self.store, today, now),
        );
        events.extend(
            self.providers
                .daily_winners
                .resolve(winners_gen, winners, &self.store, today, now),
        );

        let signals = self.providers.signal_set();
        events.extend(self.sequencer.evaluate(&signals, now));
        events
    }

    /// Re-evaluate against current signals without fetching.
    pub fn evaluate(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let signals = self.providers.signal_set();
        self.sequencer.evaluate(&signals, now)
    }

    /// Fire a due settle timer, if any.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let signals = self.providers.signal_set();
        self.sequencer.tick(&signals, now)
    }

    /// Perform the active popup's primary action (claim, confirm, or
    /// acknowledge) and close it.
    ///
    /// A failed server claim leaves the popup open and retryable; only
    /// the failure event is emitted. The sequencer never auto-retries.
    pub async fn claim_active(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let today = now.date_naive();
        match self.sequencer.active() {
            None => Vec::new(),
            Some(PopupId::AgeGate) => {
                let marker_err = self.providers.age_gate.confirm(&self.store);
                self.finish_close(PopupId::AgeGate, CloseOutcome::Dismissed, marker_err, now)
            }
            Some(PopupId::RankReward) => {
                match self.providers.rank_reward.claim(&self.client).await {
                    Ok(()) => self.finish_close(
                        PopupId::RankReward,
                        CloseOutcome::ClaimSucceeded,
                        None,
                        now,
                    ),
                    Err(e) => vec![Event::ClaimFailed {
                        popup: PopupId::RankReward,
                        reason: e.to_string(),
                        at: now,
                    }],
                }
            }
            Some(PopupId::WelcomeBonus) => {
                match self
                    .providers
                    .welcome_bonus
                    .claim(&self.client, &self.store)
                    .await
                {
                    Ok(marker_err) => self.finish_close(
                        PopupId::WelcomeBonus,
                        CloseOutcome::ClaimSucceeded,
                        marker_err,
                        now,
                    ),
                    Err(e) => vec![Event::ClaimFailed {
                        popup: PopupId::WelcomeBonus,
                        reason: e.to_string(),
                        at: now,
                    }],
                }
            }
            Some(PopupId::DailyGift) => {
                match self
                    .providers
                    .daily_gift
                    .claim(&self.client, &self.store, today)
                    .await
                {
                    Ok(marker_err) => self.finish_close(
                        PopupId::DailyGift,
                        CloseOutcome::ClaimSucceeded,
                        marker_err,
                        now,
                    ),
                    Err(e) => vec![Event::ClaimFailed {
                        popup: PopupId::DailyGift,
                        reason: e.to_string(),
                        at: now,
                    }],
                }
            }
            Some(PopupId::PersonalWinner) => {
                // Announcement only; nothing to claim or persist.
                self.finish_close(PopupId::PersonalWinner, CloseOutcome::Dismissed, None, now)
            }
            Some(PopupId::DailyWinners) => {
                let marker_err = self
                    .providers
                    .daily_winners
                    .close(&self.store, today)
                    .unwrap_or_default();
                self.finish_close(PopupId::DailyWinners, CloseOutcome::Dismissed, marker_err, now)
            }
        }
    }

    /// Dismiss the active popup without claiming.
    pub fn dismiss_active(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let today = now.date_naive();
        match self.sequencer.active() {
            None => Vec::new(),
            Some(PopupId::AgeGate) => {
                let marker_err = self.providers.age_gate.confirm(&self.store);
                self.finish_close(PopupId::AgeGate, CloseOutcome::Dismissed, marker_err, now)
            }
            Some(PopupId::RankReward) => {
                let marker_err = self
                    .providers
                    .rank_reward
                    .dismiss(&self.store, today)
                    .unwrap_or_default();
                self.finish_close(PopupId::RankReward, CloseOutcome::Dismissed, marker_err, now)
            }
            Some(PopupId::WelcomeBonus) => {
                self.providers.welcome_bonus.dismiss();
                self.finish_close(PopupId::WelcomeBonus, CloseOutcome::Dismissed, None, now)
            }
            Some(PopupId::DailyGift) => {
                self.providers.daily_gift.dismiss();
                self.finish_close(PopupId::DailyGift, CloseOutcome::Dismissed, None, now)
            }
            Some(PopupId::PersonalWinner) => {
                self.finish_close(PopupId::PersonalWinner, CloseOutcome::Dismissed, None, now)
            }
            Some(PopupId::DailyWinners) => {
                let marker_err = self
                    .providers
                    .daily_winners
                    .close(&self.store, today)
                    .unwrap_or_default();
                self.finish_close(PopupId::DailyWinners, CloseOutcome::Dismissed, marker_err, now)
            }
        }
    }

    /// Tear down for logout/unmount: in-flight fetches are discarded.
    pub fn end(&mut self) {
        self.providers.set_user(None);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish_close(
        &mut self,
        popup: PopupId,
        outcome: CloseOutcome,
        marker_err: Option<StoreError>,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(e) = marker_err {
            events.push(Event::MarkerWriteFailed {
                popup,
                reason: e.to_string(),
                at: now,
            });
        }
        let signals = self.providers.signal_set();
        events.extend(self.sequencer.close_active(outcome, &signals, now));
        events
    }
}
