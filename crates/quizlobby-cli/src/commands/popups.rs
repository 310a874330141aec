use chrono::{Duration, Utc};
use clap::Subcommand;
use quizlobby_core::{
    CloseOutcome, Config, EligibilitySignal, Event, PendingReward, PopupSequencer, Session,
    SignalSet,
};

#[derive(Subcommand)]
pub enum PopupsAction {
    /// Fetch live eligibility, run the sequence once, print events as JSON
    Status {
        /// User id to check
        #[arg(long)]
        user: String,
    },
    /// Run the sequencer offline against scripted eligibility
    Simulate {
        /// Age verification required
        #[arg(long)]
        age: bool,
        /// Pending rank reward
        #[arg(long)]
        rank: bool,
        /// Welcome bonus claimable
        #[arg(long)]
        welcome: bool,
        /// Daily gift claimable
        #[arg(long)]
        gift: bool,
        /// Winners announced today
        #[arg(long)]
        winners: bool,
    },
}

fn print_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    Ok(())
}

fn status(user: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let settle = config.settle_delay_ms;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let mut session = Session::new(user, &config)?;
        session.screen_ready(true, Utc::now());
        let events = session.refresh(Utc::now()).await;
        print_events(&events)?;

        // Let the settle timer run out, then fire it.
        if session.settle_pending().is_some() {
            tokio::time::sleep(std::time::Duration::from_millis(settle.max(0) as u64)).await;
            let events = session.tick(Utc::now());
            print_events(&events)?;
        }

        println!("{}", serde_json::to_string_pretty(&session.snapshot(Utc::now()))?);
        Ok(())
    })
}

fn simulate(signals: SignalSet) -> Result<(), Box<dyn std::error::Error>> {
    let mut sequencer = PopupSequencer::new("simulated-user");
    let mut now = Utc::now();
    let mut log = sequencer.set_screen_ready(true, &signals, now);

    // Fire each settle timer, close whatever shows, until the end.
    for _ in 0..16 {
        log.extend(sequencer.evaluate(&signals, now));
        now += Duration::milliseconds(quizlobby_core::popup::settle::DEFAULT_SETTLE_DELAY_MS);
        log.extend(sequencer.tick(&signals, now));
        if sequencer.active().is_some() {
            log.extend(sequencer.close_active(CloseOutcome::ClaimSucceeded, &signals, now));
        } else {
            break;
        }
    }

    print_events(&log)
}

pub fn run(action: PopupsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PopupsAction::Status { user } => status(&user),
        PopupsAction::Simulate {
            age,
            rank,
            welcome,
            gift,
            winners,
        } => {
            let on = |flag: bool| {
                if flag {
                    EligibilitySignal::eligible()
                } else {
                    EligibilitySignal::ineligible()
                }
            };
            let signals = SignalSet {
                age_gate: on(age),
                rank_reward: on(rank),
                welcome_bonus: on(welcome),
                daily_gift: on(gift),
                daily_winners: on(winners),
                pending_reward: rank.then(|| PendingReward {
                    reward_id: "simulated".to_string(),
                    rank: 1,
                    amount: 0,
                    awarded_on: Utc::now().date_naive(),
                }),
            };
            simulate(signals)
        }
    }
}
