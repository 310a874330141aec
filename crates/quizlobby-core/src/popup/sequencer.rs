//! Popup priority sequencer.
//!
//! The sequencer is a wall-clock-based reducer. It does not use internal
//! threads or perform I/O -- the hosting screen calls `evaluate()` on every
//! provider signal change and `tick()` periodically for settle deadlines.
//! Claims are awaited by the host before `close_active()` is called.
//!
//! ## Stage Progression
//!
//! ```text
//! Idle -> AgeGate -> RankReward -> WelcomeBonus -> DailyGift -> Terminal -> Done
//! ```
//!
//! The sequence may pass a stage only when that stage's popup is
//! ineligible-or-completed and its provider is not still loading. Loading
//! is indeterminate and blocks; it is never treated as "ineligible".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bypass::{NoBypass, TerminalGateBypass};
use super::settle::{SettleTimer, DEFAULT_SETTLE_DELAY_MS};
use super::signal::{EligibilitySignal, SignalSet};
use super::PopupId;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    AgeGate,
    RankReward,
    WelcomeBonus,
    DailyGift,
    Terminal,
    Done,
}

/// How the active popup was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Closed without a server claim, or the claim was local-only.
    Dismissed,
    /// The server claim resolved successfully before the close.
    ClaimSucceeded,
    /// The server claim failed. The completion flag stays unset so the
    /// popup remains retryable on its next natural trigger.
    ClaimFailed { reason: String },
}

/// Per-popup completion flags. Monotone for the session: once set, a flag
/// is never cleared, so a completed popup can never be shown again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedFlags {
    pub age_gate: bool,
    pub rank_reward: bool,
    pub welcome_bonus: bool,
    pub daily_gift: bool,
    /// Either terminal popup was closed.
    pub terminal: bool,
}

impl CompletedFlags {
    fn set(&mut self, popup: PopupId) {
        match popup {
            PopupId::AgeGate => self.age_gate = true,
            PopupId::RankReward => self.rank_reward = true,
            PopupId::WelcomeBonus => self.welcome_bonus = true,
            PopupId::DailyGift => self.daily_gift = true,
            PopupId::PersonalWinner | PopupId::DailyWinners => self.terminal = true,
        }
    }
}

/// What the guard conjunction wants right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    /// An upstream provider is still loading (or the screen is not ready).
    Blocked,
    Show(PopupId),
    /// Nothing left to show.
    Finished,
}

/// One stage of the priority walk.
enum StepOutcome {
    Pass,
    Show,
    Blocked,
}

fn step(signal: EligibilitySignal, completed: bool) -> StepOutcome {
    if signal.is_loading {
        StepOutcome::Blocked
    } else if signal.is_eligible && !completed {
        StepOutcome::Show
    } else {
        StepOutcome::Pass
    }
}

/// The orchestrator: single writer of popup visibility.
///
/// Holds the active popup as a single tagged value, so "at most one
/// visible" is structural rather than a maintained convention.
pub struct PopupSequencer {
    user_id: String,
    stage: Stage,
    active: Option<PopupId>,
    completed: CompletedFlags,
    settle: Option<SettleTimer>,
    settle_delay_ms: i64,
    screen_ready: bool,
    /// PersonalWinner was shown: DailyWinners stays off for the session.
    winners_locked: bool,
    bypass: Box<dyn TerminalGateBypass>,
    done_announced: bool,
}

impl PopupSequencer {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            stage: Stage::Idle,
            active: None,
            completed: CompletedFlags::default(),
            settle: None,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            screen_ready: false,
            winners_locked: false,
            bypass: Box::new(NoBypass),
            done_announced: false,
        }
    }

    pub fn with_settle_delay_ms(mut self, delay_ms: i64) -> Self {
        self.settle_delay_ms = delay_ms;
        self
    }

    pub fn with_bypass(mut self, bypass: Box<dyn TerminalGateBypass>) -> Self {
        self.bypass = bypass;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn active(&self) -> Option<PopupId> {
        self.active
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn completed(&self) -> CompletedFlags {
        self.completed
    }

    pub fn settle_pending(&self) -> Option<PopupId> {
        self.settle.map(|t| t.target())
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            stage: self.stage,
            active: self.active,
            settle_pending: self.settle_pending(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// The hosting screen became ready (or unready) to mount modals.
    pub fn set_screen_ready(
        &mut self,
        ready: bool,
        signals: &SignalSet,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        self.screen_ready = ready;
        self.evaluate(signals, now)
    }

    /// Re-run the guard conjunction against a fresh signal snapshot.
    ///
    /// Called on every provider change. Idempotent: unchanged inputs
    /// produce zero transitions and schedule no duplicate timers.
    pub fn evaluate(&mut self, signals: &SignalSet, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        let (decision, stage) = self.resolve(signals);
        self.stage = stage;

        // A visible popup freezes the pipeline until it closes.
        if self.active.is_some() {
            if let Some(timer) = self.settle.take() {
                events.push(Event::SettleCancelled {
                    popup: timer.target(),
                    at: now,
                });
            }
            return events;
        }

        match decision {
            Decision::Show(target) => match self.settle {
                // Already armed for the same popup: leave the deadline alone.
                Some(timer) if timer.target() == target => {}
                Some(timer) => {
                    events.push(Event::SettleCancelled {
                        popup: timer.target(),
                        at: now,
                    });
                    let armed = SettleTimer::arm(target, now, self.settle_delay_ms);
                    events.push(Event::SettleArmed {
                        popup: target,
                        fires_at: armed.fires_at(),
                        at: now,
                    });
                    self.settle = Some(armed);
                }
                None => {
                    let armed = SettleTimer::arm(target, now, self.settle_delay_ms);
                    events.push(Event::SettleArmed {
                        popup: target,
                        fires_at: armed.fires_at(),
                        at: now,
                    });
                    self.settle = Some(armed);
                }
            },
            Decision::Blocked => {
                if let Some(timer) = self.settle.take() {
                    events.push(Event::SettleCancelled {
                        popup: timer.target(),
                        at: now,
                    });
                }
            }
            Decision::Finished => {
                if let Some(timer) = self.settle.take() {
                    events.push(Event::SettleCancelled {
                        popup: timer.target(),
                        at: now,
                    });
                }
                if !self.done_announced {
                    self.done_announced = true;
                    events.push(Event::SequenceCompleted { at: now });
                }
            }
        }
        events
    }

    /// Fire a due settle timer. The guard is re-checked at fire time --
    /// a slower provider may have changed the outcome while the timer
    /// was pending, in which case the show is abandoned, not flashed.
    pub fn tick(&mut self, signals: &SignalSet, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(timer) = self.settle else {
            return events;
        };
        if !timer.is_due(now) {
            return events;
        }
        let target = timer.target();
        self.settle = None;

        let (decision, stage) = self.resolve(signals);
        self.stage = stage;
        if self.active.is_none() && decision == Decision::Show(target) {
            self.active = Some(target);
            if target == PopupId::PersonalWinner {
                self.winners_locked = true;
            }
            events.push(Event::PopupShown {
                popup: target,
                at: now,
            });
        } else {
            events.push(Event::SettleCancelled {
                popup: target,
                at: now,
            });
            events.extend(self.evaluate(signals, now));
        }
        events
    }

    /// Close the active popup.
    ///
    /// The close contract: visibility off; the completion flag is recorded
    /// unless the claim failed; then the pipeline is re-evaluated so the
    /// next popup (if any) gets its settle delay.
    pub fn close_active(
        &mut self,
        outcome: CloseOutcome,
        signals: &SignalSet,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(popup) = self.active.take() else {
            return events;
        };

        let completed = !matches!(outcome, CloseOutcome::ClaimFailed { .. });
        if completed {
            self.completed.set(popup);
        }
        match outcome {
            CloseOutcome::ClaimSucceeded => {
                events.push(Event::ClaimSucceeded { popup, at: now });
            }
            CloseOutcome::ClaimFailed { reason } => {
                events.push(Event::ClaimFailed {
                    popup,
                    reason,
                    at: now,
                });
            }
            CloseOutcome::Dismissed => {}
        }
        events.push(Event::PopupClosed {
            popup,
            completed,
            at: now,
        });
        events.extend(self.evaluate(signals, now));
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Walk the priority order and decide what (if anything) should show.
    fn resolve(&self, s: &SignalSet) -> (Decision, Stage) {
        if !self.screen_ready {
            // Done is terminal; unmounting the screen does not reset it.
            let stage = if self.stage == Stage::Done {
                Stage::Done
            } else {
                Stage::Idle
            };
            return (Decision::Blocked, stage);
        }

        match step(s.age_gate, self.completed.age_gate) {
            StepOutcome::Blocked => return (Decision::Blocked, Stage::AgeGate),
            StepOutcome::Show => return (Decision::Show(PopupId::AgeGate), Stage::AgeGate),
            StepOutcome::Pass => {}
        }

        match step(s.rank_reward, self.completed.rank_reward) {
            StepOutcome::Blocked => return (Decision::Blocked, Stage::RankReward),
            StepOutcome::Show => return (Decision::Show(PopupId::RankReward), Stage::RankReward),
            StepOutcome::Pass => {}
        }

        match step(s.welcome_bonus, self.completed.welcome_bonus) {
            StepOutcome::Blocked => return (Decision::Blocked, Stage::WelcomeBonus),
            StepOutcome::Show => {
                return (Decision::Show(PopupId::WelcomeBonus), Stage::WelcomeBonus)
            }
            StepOutcome::Pass => {}
        }

        // The diagnostic bypass lifts only this gate, never earlier ones:
        // a stalled or uncompleted daily gift stops blocking the terminal
        // branch, but a showable gift still takes priority.
        match step(s.daily_gift, self.completed.daily_gift) {
            StepOutcome::Show => return (Decision::Show(PopupId::DailyGift), Stage::DailyGift),
            StepOutcome::Blocked => {
                if !self.bypass.skips_daily_gift_gate(&self.user_id) {
                    return (Decision::Blocked, Stage::DailyGift);
                }
            }
            StepOutcome::Pass => {}
        }

        // Terminal branch: a pending rank reward (re-checked here) means
        // PersonalWinner, and DailyWinners stays off for the session.
        if self.completed.terminal {
            return (Decision::Finished, Stage::Done);
        }
        if s.pending_reward.is_some() {
            return (Decision::Show(PopupId::PersonalWinner), Stage::Terminal);
        }
        if self.winners_locked {
            return (Decision::Finished, Stage::Done);
        }
        if s.daily_winners.is_loading {
            return (Decision::Blocked, Stage::Terminal);
        }
        if s.daily_winners.is_eligible {
            return (Decision::Show(PopupId::DailyWinners), Stage::Terminal);
        }
        (Decision::Finished, Stage::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::super::bypass::DiagnosticBypass;
    use super::super::signal::PendingReward;
    use super::*;
    use chrono::Duration;

    fn ready_sequencer() -> (PopupSequencer, SignalSet, DateTime<Utc>) {
        let mut seq = PopupSequencer::new("user-1").with_settle_delay_ms(500);
        let signals = SignalSet::default();
        let now = Utc::now();
        seq.set_screen_ready(true, &signals, now);
        (seq, signals, now)
    }

    fn all_ineligible() -> SignalSet {
        SignalSet {
            age_gate: EligibilitySignal::ineligible(),
            rank_reward: EligibilitySignal::ineligible(),
            welcome_bonus: EligibilitySignal::ineligible(),
            daily_gift: EligibilitySignal::ineligible(),
            daily_winners: EligibilitySignal::ineligible(),
            pending_reward: None,
        }
    }

    /// Arm, wait out the settle delay, fire.
    fn settle_and_show(
        seq: &mut PopupSequencer,
        signals: &SignalSet,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        seq.evaluate(signals, now);
        let fired = now + Duration::milliseconds(500);
        seq.tick(signals, fired);
        fired
    }

    #[test]
    fn nothing_shows_while_screen_not_ready() {
        let mut seq = PopupSequencer::new("user-1");
        let mut signals = all_ineligible();
        signals.daily_gift = EligibilitySignal::eligible();
        let now = Utc::now();
        let events = seq.evaluate(&signals, now);
        assert!(events.is_empty());
        assert_eq!(seq.active(), None);
        assert_eq!(seq.settle_pending(), None);
    }

    #[test]
    fn loading_blocks_lower_priority() {
        let (mut seq, _, now) = ready_sequencer();
        let mut signals = all_ineligible();
        // Daily gift eligible, but age gate still indeterminate.
        signals.age_gate = EligibilitySignal::loading();
        signals.daily_gift = EligibilitySignal::eligible();
        seq.evaluate(&signals, now);
        assert_eq!(seq.settle_pending(), None);
        assert_eq!(seq.stage(), Stage::AgeGate);
    }

    #[test]
    fn settle_timer_arms_and_fires() {
        let (mut seq, _, now) = ready_sequencer();
        let mut signals = all_ineligible();
        signals.daily_gift = EligibilitySignal::eligible();

        let events = seq.evaluate(&signals, now);
        assert!(matches!(events[0], Event::SettleArmed { popup: PopupId::DailyGift, .. }));
        assert_eq!(seq.active(), None);

        // Before the deadline nothing fires.
        assert!(seq.tick(&signals, now + Duration::milliseconds(499)).is_empty());

        let events = seq.tick(&signals, now + Duration::milliseconds(500));
        assert!(matches!(events[0], Event::PopupShown { popup: PopupId::DailyGift, .. }));
        assert_eq!(seq.active(), Some(PopupId::DailyGift));
    }

    #[test]
    fn guard_flip_cancels_pending_settle() {
        let (mut seq, _, now) = ready_sequencer();
        let mut signals = all_ineligible();
        signals.rank_reward = EligibilitySignal::loading();
        signals.daily_gift = EligibilitySignal::eligible();
        // Rank reward resolved ineligible first; gift timer arms.
        signals.rank_reward = EligibilitySignal::ineligible();
        seq.evaluate(&signals, now);
        assert_eq!(seq.settle_pending(), Some(PopupId::DailyGift));

        // A slower sibling resolves eligible before the timer fires.
        signals.age_gate = EligibilitySignal::eligible();
        let events = seq.evaluate(&signals, now + Duration::milliseconds(100));
        assert!(matches!(events[0], Event::SettleCancelled { popup: PopupId::DailyGift, .. }));
        assert_eq!(seq.settle_pending(), Some(PopupId::AgeGate));
        // No flash: gift was never shown.
        assert_eq!(seq.active(), None);
    }

    #[test]
    fn guard_rechecked_at_fire_time() {
        let (mut seq, _, now) = ready_sequencer();
        let mut signals = all_ineligible();
        signals.daily_gift = EligibilitySignal::eligible();
        seq.evaluate(&signals, now);

        // Guard flips false while the timer is pending; tick must not show.
        signals.daily_gift = EligibilitySignal::ineligible();
        let events = seq.tick(&signals, now + Duration::milliseconds(500));
        assert!(matches!(events[0], Event::SettleCancelled { popup: PopupId::DailyGift, .. }));
        assert_eq!(seq.active(), None);
    }

    #[test]
    fn evaluate_is_idempotent() {
        let (mut seq, _, now) = ready_sequencer();
        let mut signals = all_ineligible();
        signals.welcome_bonus = EligibilitySignal::eligible();

        let first = seq.evaluate(&signals, now);
        assert_eq!(first.len(), 1);
        let deadline = seq.settle.unwrap().fires_at();

        // Same inputs: no new events, same deadline.
        let again = seq.evaluate(&signals, now + Duration::milliseconds(100));
        assert!(again.is_empty());
        assert_eq!(seq.settle.unwrap().fires_at(), deadline);
    }

    #[test]
    fn close_with_claim_success_records_completion() {
        let (mut seq, _, now) = ready_sequencer();
        let mut signals = all_ineligible();
        signals.welcome_bonus = EligibilitySignal::eligible();
        let shown_at = settle_and_show(&mut seq, &signals, now);
        assert_eq!(seq.active(), Some(PopupId::WelcomeBonus));

        let events = seq.close_active(CloseOutcome::ClaimSucceeded, &signals, shown_at);
        assert!(matches!(events[0], Event::ClaimSucceeded { .. }));
        assert!(matches!(events[1], Event::PopupClosed { completed: true, .. }));
        assert!(seq.completed().welcome_bonus);

        // Still eligible per the (stale) signal, but completed wins forever.
        let events = seq.evaluate(&signals, shown_at + Duration::seconds(10));
        assert!(events.iter().all(|e| !matches!(e, Event::SettleArmed { .. })));
    }

    #[test]
    fn failed_claim_leaves_popup_retryable() {
        let (mut seq, _, now) = ready_sequencer();
        let mut signals = all_ineligible();
        signals.daily_gift = EligibilitySignal::eligible();
        let shown_at = settle_and_show(&mut seq, &signals, now);

        let events = seq.close_active(
            CloseOutcome::ClaimFailed {
                reason: "server 500".into(),
            },
            &signals,
            shown_at,
        );
        assert!(matches!(events[0], Event::ClaimFailed { .. }));
        assert!(matches!(events[1], Event::PopupClosed { completed: false, .. }));
        assert!(!seq.completed().daily_gift);

        // Next natural re-evaluation re-arms the gift; no auto-retry of the
        // claim itself happened in between.
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::SettleArmed { popup: PopupId::DailyGift, .. })));
    }

    #[test]
    fn pending_reward_routes_terminal_to_personal_winner() {
        let (mut seq, _, now) = ready_sequencer();
        let mut signals = all_ineligible();
        signals.pending_reward = Some(PendingReward {
            reward_id: "r-1".into(),
            rank: 1,
            amount: 1000,
            awarded_on: now.date_naive(),
        });
        signals.daily_winners = EligibilitySignal::eligible();

        let shown_at = settle_and_show(&mut seq, &signals, now);
        assert_eq!(seq.active(), Some(PopupId::PersonalWinner));

        // After closing, DailyWinners must never appear this session even
        // if the pending reward later clears.
        seq.close_active(CloseOutcome::Dismissed, &signals, shown_at);
        signals.pending_reward = None;
        let events = seq.evaluate(&signals, shown_at + Duration::seconds(1));
        assert!(events
            .iter()
            .all(|e| !matches!(e, Event::SettleArmed { popup: PopupId::DailyWinners, .. })));
        assert_eq!(seq.stage(), Stage::Done);
    }

    #[test]
    fn no_pending_reward_routes_terminal_to_daily_winners() {
        let (mut seq, _, now) = ready_sequencer();
        let mut signals = all_ineligible();
        signals.daily_winners = EligibilitySignal::eligible();
        settle_and_show(&mut seq, &signals, now);
        assert_eq!(seq.active(), Some(PopupId::DailyWinners));
    }

    #[test]
    fn empty_terminal_goes_done_once() {
        let (mut seq, _, now) = ready_sequencer();
        let signals = all_ineligible();
        let events = seq.evaluate(&signals, now);
        assert!(matches!(events[0], Event::SequenceCompleted { .. }));
        assert_eq!(seq.stage(), Stage::Done);

        // Finishing is announced exactly once.
        let events = seq.evaluate(&signals, now + Duration::seconds(1));
        assert!(events.is_empty());
    }

    #[test]
    fn done_stage_survives_screen_unmount() {
        let (mut seq, _, now) = ready_sequencer();
        let signals = all_ineligible();
        seq.evaluate(&signals, now);
        assert_eq!(seq.stage(), Stage::Done);

        seq.set_screen_ready(false, &signals, now + Duration::seconds(1));
        assert_eq!(seq.stage(), Stage::Done);
    }

    #[test]
    fn bypass_lets_diagnostic_identity_past_stalled_gift() {
        let mut seq = PopupSequencer::new("qa-robot")
            .with_settle_delay_ms(500)
            .with_bypass(Box::new(DiagnosticBypass::new("qa-robot")));
        let mut signals = all_ineligible();
        signals.daily_gift = EligibilitySignal::loading();
        signals.daily_winners = EligibilitySignal::eligible();
        let now = Utc::now();
        seq.set_screen_ready(true, &signals, now);
        seq.tick(&signals, now + Duration::milliseconds(500));
        assert_eq!(seq.active(), Some(PopupId::DailyWinners));
    }

    #[test]
    fn bypass_does_not_apply_to_other_identities() {
        let mut seq = PopupSequencer::new("regular-user")
            .with_bypass(Box::new(DiagnosticBypass::new("qa-robot")));
        let mut signals = all_ineligible();
        signals.daily_gift = EligibilitySignal::loading();
        signals.daily_winners = EligibilitySignal::eligible();
        let now = Utc::now();
        seq.set_screen_ready(true, &signals, now);
        assert_eq!(seq.settle_pending(), None);
        assert_eq!(seq.stage(), Stage::DailyGift);
    }

    #[test]
    fn showable_gift_still_beats_bypass() {
        let mut seq = PopupSequencer::new("qa-robot")
            .with_bypass(Box::new(DiagnosticBypass::new("qa-robot")));
        let mut signals = all_ineligible();
        signals.daily_gift = EligibilitySignal::eligible();
        signals.daily_winners = EligibilitySignal::eligible();
        let now = Utc::now();
        seq.set_screen_ready(true, &signals, now);
        assert_eq!(seq.settle_pending(), Some(PopupId::DailyGift));
    }
}
