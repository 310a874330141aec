//! # Quizlobby Core Library
//!
//! Core logic for the Quizlobby landing screen's popup orchestration. Five
//! modal dialogs compete for the screen -- age verification, a rank-reward
//! claim, a welcome bonus, a daily gift, and the winners announcement --
//! and each one's eligibility comes from an independent, slow, unordered
//! asynchronous check. This crate decides which single popup (if any) may
//! be visible at each moment.
//!
//! ## Architecture
//!
//! - **Sequencer**: a wall-clock-based reducer invoked on every signal
//!   change; the single writer of popup visibility
//! - **Providers**: five generation-counted eligibility sources that
//!   resolve fail-closed and own their seen/claimed markers
//! - **Settle timer**: a cancellable deadline between a guard becoming
//!   true and the popup appearing
//! - **Storage**: TOML-based configuration and per-user marker records
//!
//! ## Key Components
//!
//! - [`PopupSequencer`]: the priority state machine
//! - [`Session`]: per-login wiring of providers, client, store, sequencer
//! - [`BackendClient`]: REST client for eligibility checks and claims
//! - [`SeenStore`]: seen/claimed marker persistence

pub mod backend;
pub mod error;
pub mod events;
pub mod popup;
pub mod providers;
pub mod session;
pub mod storage;

pub use backend::BackendClient;
pub use error::{BackendError, ClaimError, CoreError, StoreError};
pub use events::Event;
pub use popup::{
    CloseOutcome, CompletedFlags, DiagnosticBypass, EligibilitySignal, NoBypass, PendingReward,
    PopupId, PopupSequencer, SettleTimer, SignalSet, Stage, TerminalGateBypass,
};
pub use providers::Providers;
pub use session::Session;
pub use storage::{Config, SeenStore};
