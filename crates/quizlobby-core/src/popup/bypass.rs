//! Terminal-branch gate bypass for a designated diagnostic identity.
//!
//! One test identity may enter the terminal branch without the daily-gift
//! gate being satisfied. The strategy is injected so the default build
//! cannot activate it for any other identity.

/// Strategy deciding whether a user skips the daily-gift completion gate
/// when the terminal branch is evaluated. Applies to that gate only; it
/// never affects earlier stages.
pub trait TerminalGateBypass: Send + Sync {
    fn skips_daily_gift_gate(&self, user_id: &str) -> bool;
}

/// Default strategy: nobody skips.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBypass;

impl TerminalGateBypass for NoBypass {
    fn skips_daily_gift_gate(&self, _user_id: &str) -> bool {
        false
    }
}

/// Bypass for exactly one configured identity.
#[derive(Debug, Clone)]
pub struct DiagnosticBypass {
    user_id: String,
}

impl DiagnosticBypass {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

impl TerminalGateBypass for DiagnosticBypass {
    fn skips_daily_gift_gate(&self, user_id: &str) -> bool {
        user_id == self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_bypass_never_skips() {
        assert!(!NoBypass.skips_daily_gift_gate("anyone"));
    }

    #[test]
    fn diagnostic_bypass_matches_exactly_one_identity() {
        let bypass = DiagnosticBypass::new("qa-robot");
        assert!(bypass.skips_daily_gift_gate("qa-robot"));
        assert!(!bypass.skips_daily_gift_gate("qa-robot-2"));
        assert!(!bypass.skips_daily_gift_gate(""));
    }
}
