use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

/// Turn-level phase of a flip-match session.
///
/// The phase is derived from the session data after every action; it never
/// carries state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// No unmatched card is face-up.
    Idle,
    /// Exactly one unmatched card is face-up.
    OneRevealed,
    /// Two unmatched cards are face-up and are being compared.
    Resolving,
    /// Flips are refused until a deferred unlock runs.
    Locked(LockReason),
    /// Every pair has been found. Terminal.
    Complete,
}

/// Why a session refuses flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    /// Two mismatched cards stay visible for the cooldown.
    Mismatch,
    /// Every card is visible during a peek window.
    Peek,
}

impl TurnPhase {
    /// Whether a flip may be attempted from this phase.
    pub fn accepts_flip(self) -> bool {
        match self {
            TurnPhase::Idle | TurnPhase::OneRevealed => true,
            TurnPhase::Resolving | TurnPhase::Locked(_) | TurnPhase::Complete => false,
        }
    }

    /// Whether a power-up may be used from this phase.
    pub fn accepts_powerup(self) -> bool {
        !matches!(self, TurnPhase::Complete)
    }
}

/// Work the session asks its owner to run later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Turn the mismatched pair face-down and unlock.
    HideMismatch,
    /// Close the peek window and unlock.
    EndPeek,
}

/// A deferred callback bound to the session generation and lock that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deferred {
    /// What to run once `delay` has elapsed.
    pub action: DeferredAction,
    /// How long to wait before running it.
    pub delay: Duration,
    pub(crate) generation: u64,
    pub(crate) lock_id: u64,
}

/// Result of a flip attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// The flip was refused and nothing changed.
    Ignored,
    /// The card turned face-up and waits for a partner.
    Revealed {
        /// This was the first flip of the session; the timer just started.
        first_flip: bool,
    },
    /// The card completed a pair.
    Matched {
        /// This was the first flip of the session; the timer just started.
        first_flip: bool,
        /// The last pair was found and the session is now complete.
        completed: bool,
    },
    /// The card did not match; both stay visible until `unlock` runs.
    Mismatched {
        /// This was the first flip of the session; the timer just started.
        first_flip: bool,
        /// Cooldown that turns both cards back down.
        unlock: Deferred,
    },
}

impl FlipOutcome {
    /// True when this flip started the session timer.
    pub fn started_timer(&self) -> bool {
        match self {
            FlipOutcome::Ignored => false,
            FlipOutcome::Revealed { first_flip }
            | FlipOutcome::Matched { first_flip, .. }
            | FlipOutcome::Mismatched { first_flip, .. } => *first_flip,
        }
    }

    /// True when this flip completed the session.
    pub fn completed(&self) -> bool {
        matches!(
            self,
            FlipOutcome::Matched {
                completed: true,
                ..
            }
        )
    }
}

/// Result of a power-up use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpOutcome {
    /// The power-up had no effect and nothing was charged.
    Ignored,
    /// Every card is visible until `end` runs.
    Peeked {
        /// Deferred close of the peek window.
        end: Deferred,
        /// Penalty added by this use, in milliseconds.
        penalty_ms: u64,
    },
    /// A random remaining pair was matched.
    AutoMatched {
        /// Pair value that was matched.
        value: u8,
        /// Penalty added by this use, in milliseconds.
        penalty_ms: u64,
        /// The last pair was found and the session is now complete.
        completed: bool,
    },
}

impl PowerUpOutcome {
    /// Whether the power-up took effect.
    pub fn applied(&self) -> bool {
        !matches!(self, PowerUpOutcome::Ignored)
    }

    /// True when this use completed the session.
    pub fn completed(&self) -> bool {
        matches!(
            self,
            PowerUpOutcome::AutoMatched {
                completed: true,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_phases_accept_flips() {
        assert!(TurnPhase::Idle.accepts_flip());
        assert!(TurnPhase::OneRevealed.accepts_flip());
        assert!(!TurnPhase::Resolving.accepts_flip());
        assert!(!TurnPhase::Locked(LockReason::Mismatch).accepts_flip());
        assert!(!TurnPhase::Locked(LockReason::Peek).accepts_flip());
        assert!(!TurnPhase::Complete.accepts_flip());
    }

    #[test]
    fn powerups_are_refused_only_once_complete() {
        assert!(TurnPhase::Locked(LockReason::Mismatch).accepts_powerup());
        assert!(TurnPhase::OneRevealed.accepts_powerup());
        assert!(!TurnPhase::Complete.accepts_powerup());
    }

    #[test]
    fn outcome_helpers_report_timer_and_completion() {
        let unlock = Deferred {
            action: DeferredAction::HideMismatch,
            delay: Duration::from_millis(1000),
            generation: 0,
            lock_id: 1,
        };

        assert!(!FlipOutcome::Ignored.started_timer());
        assert!(FlipOutcome::Revealed { first_flip: true }.started_timer());
        assert!(
            FlipOutcome::Mismatched {
                first_flip: true,
                unlock
            }
            .started_timer()
        );
        assert!(
            FlipOutcome::Matched {
                first_flip: false,
                completed: true
            }
            .completed()
        );
        assert!(!FlipOutcome::Mismatched {
            first_flip: false,
            unlock
        }
        .completed());
    }
}
