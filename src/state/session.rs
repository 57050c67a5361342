use std::sync::Arc;

use rand::{Rng, seq::IndexedRandom};

use crate::{
    config::GameTimings,
    state::{
        board::{Board, Card, PAIR_COUNT},
        clock::Clock,
        inventory::{Inventory, PowerUpKind},
        state_machine::{
            Deferred, DeferredAction, FlipOutcome, LockReason, PowerUpOutcome, TurnPhase,
        },
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Lock {
    id: u64,
    reason: LockReason,
}

/// Immutable copy of a session, published after every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Cards in position order.
    pub cards: Vec<Card>,
    /// Derived turn phase.
    pub phase: TurnPhase,
    /// The timer is running.
    pub is_running: bool,
    /// Every pair has been found.
    pub is_complete: bool,
    /// Time since the first flip, without penalties.
    pub elapsed_ms: u64,
    /// Accumulated power-up penalties.
    pub penalties_ms: u64,
    /// At least one card has been flipped.
    pub first_flip_happened: bool,
    /// 1 while a single card of the current turn is face-up.
    pub flips_this_turn: u8,
    /// Pairs found so far (0..=8).
    pub pairs_matched: u8,
    /// Power-up charges held.
    pub inventory: Inventory,
    /// The entry fee has been confirmed.
    pub has_entry_paid: bool,
    /// Wall-clock instant of the first flip, in epoch milliseconds.
    pub started_at_ms: Option<u64>,
    /// Score frozen at completion.
    pub final_time_ms: Option<u64>,
    /// Incremented on every reset.
    pub generation: u64,
}

impl SessionSnapshot {
    /// Elapsed time plus penalties, as displayed while playing.
    pub fn running_time_ms(&self) -> u64 {
        self.elapsed_ms + self.penalties_ms
    }
}

/// In-memory flip-match game: board, timer, penalties and inventory.
///
/// All methods are synchronous. Work that must happen later (turning a
/// mismatched pair back down, closing a peek window) is returned as a
/// [`Deferred`] that the owner feeds back through [`Self::apply_deferred`].
pub struct FlipMatchSession {
    board: Board,
    timings: GameTimings,
    clock: Arc<dyn Clock>,
    is_running: bool,
    is_complete: bool,
    elapsed_ms: u64,
    penalties_ms: u64,
    first_flip_happened: bool,
    flips_this_turn: u8,
    pairs_matched: u8,
    inventory: Inventory,
    has_entry_paid: bool,
    started_at_ms: Option<u64>,
    final_time_ms: Option<u64>,
    generation: u64,
    lock: Option<Lock>,
    next_lock_id: u64,
}

impl FlipMatchSession {
    /// Start a session on a freshly shuffled board.
    pub fn new(timings: GameTimings, clock: Arc<dyn Clock>) -> Self {
        Self::with_board(Board::shuffled(), timings, clock)
    }

    /// Start a session on the given board.
    pub fn with_board(board: Board, timings: GameTimings, clock: Arc<dyn Clock>) -> Self {
        Self {
            board,
            timings,
            clock,
            is_running: false,
            is_complete: false,
            elapsed_ms: 0,
            penalties_ms: 0,
            first_flip_happened: false,
            flips_this_turn: 0,
            pairs_matched: 0,
            inventory: Inventory::default(),
            has_entry_paid: false,
            started_at_ms: None,
            final_time_ms: None,
            generation: 0,
            lock: None,
            next_lock_id: 0,
        }
    }

    /// Current turn phase.
    pub fn phase(&self) -> TurnPhase {
        if self.is_complete {
            return TurnPhase::Complete;
        }
        if let Some(lock) = self.lock {
            return TurnPhase::Locked(lock.reason);
        }
        match self.board.pending_indices().len() {
            0 => TurnPhase::Idle,
            1 => TurnPhase::OneRevealed,
            _ => TurnPhase::Resolving,
        }
    }

    /// The board as currently laid out.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Reset counter; deferred work from older generations is ignored.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Timer running and game not finished.
    pub fn is_in_game(&self) -> bool {
        self.is_running && !self.is_complete
    }

    /// Whether the timer is running.
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Turn the card at `index` face-up and resolve the turn.
    pub fn flip_card(&mut self, index: usize) -> FlipOutcome {
        if !self.has_entry_paid || !self.phase().accepts_flip() {
            return FlipOutcome::Ignored;
        }

        let Some(card) = self.board.card_mut(index) else {
            return FlipOutcome::Ignored;
        };
        if card.is_matched || card.is_revealed {
            return FlipOutcome::Ignored;
        }
        card.is_revealed = true;

        let first_flip = !self.first_flip_happened;
        if first_flip {
            self.start_timer();
        }

        let pending = self.board.pending_indices();
        let &[first, second] = pending.as_slice() else {
            self.flips_this_turn = 1;
            return FlipOutcome::Revealed { first_flip };
        };
        self.flips_this_turn = 0;

        let cards = self.board.cards();
        if cards[first].value == cards[second].value {
            for index in [first, second] {
                if let Some(card) = self.board.card_mut(index) {
                    card.is_matched = true;
                }
            }
            let completed = self.finish_if_done();
            FlipOutcome::Matched {
                first_flip,
                completed,
            }
        } else {
            let unlock = self.lock(
                LockReason::Mismatch,
                DeferredAction::HideMismatch,
                self.timings.mismatch_cooldown,
            );
            FlipOutcome::Mismatched { first_flip, unlock }
        }
    }

    /// Reveal every card for the peek window.
    pub fn use_peek(&mut self) -> PowerUpOutcome {
        if !self.phase().accepts_powerup() {
            return PowerUpOutcome::Ignored;
        }

        for card in self.board.cards_mut() {
            card.is_revealed = true;
        }
        self.flips_this_turn = 0;
        let penalty_ms = self.charge_penalty();
        let end = self.lock(
            LockReason::Peek,
            DeferredAction::EndPeek,
            self.timings.peek_window,
        );

        PowerUpOutcome::Peeked { end, penalty_ms }
    }

    /// Match one random remaining pair.
    pub fn use_auto_match(&mut self) -> PowerUpOutcome {
        self.use_auto_match_with(&mut rand::rng())
    }

    /// Match one remaining pair picked with the provided RNG.
    pub fn use_auto_match_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> PowerUpOutcome {
        if !self.phase().accepts_powerup() || self.board.unmatched_count() < 2 {
            return PowerUpOutcome::Ignored;
        }

        let values = self.board.unmatched_values();
        let Some(&value) = values.choose(rng) else {
            return PowerUpOutcome::Ignored;
        };

        for card in self
            .board
            .cards_mut()
            .filter(|card| !card.is_matched && card.value == value)
        {
            card.is_matched = true;
            card.is_revealed = true;
        }

        let penalty_ms = self.charge_penalty();
        let completed = self.finish_if_done();
        self.flips_this_turn = u8::from(self.board.pending_indices().len() == 1);

        PowerUpOutcome::AutoMatched {
            value,
            penalty_ms,
            completed,
        }
    }

    /// Apply a power-up of the given kind directly.
    pub fn use_powerup(&mut self, kind: PowerUpKind) -> PowerUpOutcome {
        match kind {
            PowerUpKind::Peek => self.use_peek(),
            PowerUpKind::AutoMatch => self.use_auto_match(),
        }
    }

    /// Spend one stocked charge of `kind` and apply it.
    ///
    /// No charge is consumed when the stock is empty or the game is complete.
    pub fn use_from_inventory(&mut self, kind: PowerUpKind) -> PowerUpOutcome {
        if !self.phase().accepts_powerup() || !self.inventory.take(kind) {
            return PowerUpOutcome::Ignored;
        }
        self.use_powerup(kind)
    }

    /// Add `count` charges of `kind` (negative removes), floored at zero.
    pub fn add_to_inventory(&mut self, kind: PowerUpKind, count: i64) {
        self.inventory.adjust(kind, count);
    }

    /// Replace the inventory with counts read from durable storage.
    pub fn set_inventory_counts(&mut self, peek: f64, auto_match: f64) {
        self.inventory = Inventory::from_counts(peek, auto_match);
    }

    /// Confirm the entry fee. Irreversible until the next reset.
    pub fn mark_entry_paid(&mut self) {
        self.has_entry_paid = true;
    }

    /// Deal a new board and clear every counter, flag and pending lock.
    pub fn reset(&mut self) {
        self.reset_with_board(Board::shuffled());
    }

    /// Reset onto the given board.
    pub fn reset_with_board(&mut self, board: Board) {
        let generation = self.generation + 1;
        let next_lock_id = self.next_lock_id;
        *self = Self::with_board(board, self.timings, Arc::clone(&self.clock));
        self.generation = generation;
        self.next_lock_id = next_lock_id;
    }

    /// Run deferred work previously handed out by this session.
    ///
    /// Returns `false` when the work is stale: scheduled before a reset, or
    /// superseded by a newer lock.
    pub fn apply_deferred(&mut self, deferred: Deferred) -> bool {
        if deferred.generation != self.generation {
            return false;
        }
        match self.lock {
            Some(lock) if lock.id == deferred.lock_id => {}
            _ => return false,
        }

        match deferred.action {
            DeferredAction::HideMismatch | DeferredAction::EndPeek => self.board.hide_unmatched(),
        }
        self.lock = None;
        self.flips_this_turn = 0;
        true
    }

    /// Refresh the elapsed time from the clock. Returns `true` when it changed.
    pub fn sample_elapsed(&mut self) -> bool {
        if !self.is_running || self.is_complete {
            return false;
        }
        let Some(started_at) = self.started_at_ms else {
            return false;
        };

        let elapsed = self.clock.now_ms().saturating_sub(started_at);
        let changed = elapsed != self.elapsed_ms;
        self.elapsed_ms = elapsed;
        changed
    }

    /// Copy the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            cards: self.board.cards().to_vec(),
            phase: self.phase(),
            is_running: self.is_running,
            is_complete: self.is_complete,
            elapsed_ms: self.elapsed_ms,
            penalties_ms: self.penalties_ms,
            first_flip_happened: self.first_flip_happened,
            flips_this_turn: self.flips_this_turn,
            pairs_matched: self.pairs_matched,
            inventory: self.inventory,
            has_entry_paid: self.has_entry_paid,
            started_at_ms: self.started_at_ms,
            final_time_ms: self.final_time_ms,
            generation: self.generation,
        }
    }

    fn start_timer(&mut self) {
        self.first_flip_happened = true;
        self.is_running = true;
        self.started_at_ms = Some(self.clock.now_ms());
    }

    fn charge_penalty(&mut self) -> u64 {
        if !self.first_flip_happened {
            return 0;
        }
        let penalty_ms = self.timings.powerup_penalty.as_millis() as u64;
        self.penalties_ms += penalty_ms;
        penalty_ms
    }

    fn lock(
        &mut self,
        reason: LockReason,
        action: DeferredAction,
        delay: std::time::Duration,
    ) -> Deferred {
        self.next_lock_id += 1;
        self.lock = Some(Lock {
            id: self.next_lock_id,
            reason,
        });
        Deferred {
            action,
            delay,
            generation: self.generation,
            lock_id: self.next_lock_id,
        }
    }

    fn finish_if_done(&mut self) -> bool {
        self.pairs_matched = self.board.matched_pairs();
        if self.pairs_matched < PAIR_COUNT || self.is_complete {
            return false;
        }

        self.sample_elapsed();
        self.is_running = false;
        self.is_complete = true;
        self.final_time_ms = Some(self.elapsed_ms + self.penalties_ms);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::state::clock::ManualClock;

    /// Pairs laid out so that 0/1 match, 2/3 do not, 2/4 and 3/5 do.
    const LAYOUT: [u8; 16] = [0, 0, 1, 2, 1, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7];

    fn session() -> (FlipMatchSession, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let board = Board::from_values(&LAYOUT).unwrap();
        let mut session = FlipMatchSession::with_board(board, GameTimings::default(), clock.clone());
        session.mark_entry_paid();
        (session, clock)
    }

    fn solve(session: &mut FlipMatchSession) {
        for (a, b) in [(0, 1), (2, 4), (3, 5), (6, 7), (8, 9), (10, 11), (12, 13), (14, 15)] {
            session.flip_card(a);
            session.flip_card(b);
        }
    }

    #[test]
    fn flips_are_refused_until_entry_is_paid() {
        let clock = Arc::new(ManualClock::new(0));
        let mut session = FlipMatchSession::with_board(
            Board::from_values(&LAYOUT).unwrap(),
            GameTimings::default(),
            clock,
        );

        assert_eq!(session.flip_card(0), FlipOutcome::Ignored);
        session.mark_entry_paid();
        assert_eq!(
            session.flip_card(0),
            FlipOutcome::Revealed { first_flip: true }
        );
    }

    #[test]
    fn first_flip_starts_the_timer() {
        let (mut session, clock) = session();
        assert!(!session.snapshot().is_running);

        session.flip_card(0);
        let snapshot = session.snapshot();
        assert!(snapshot.is_running);
        assert!(snapshot.first_flip_happened);
        assert_eq!(snapshot.started_at_ms, Some(1_000_000));
        assert_eq!(snapshot.phase, TurnPhase::OneRevealed);
        assert_eq!(snapshot.flips_this_turn, 1);

        clock.advance(Duration::from_millis(1_234));
        assert!(session.sample_elapsed());
        assert_eq!(session.snapshot().elapsed_ms, 1_234);
    }

    #[test]
    fn matching_pair_stays_face_up() {
        let (mut session, _) = session();
        session.flip_card(0);
        let outcome = session.flip_card(1);

        assert_eq!(
            outcome,
            FlipOutcome::Matched {
                first_flip: false,
                completed: false
            }
        );
        let snapshot = session.snapshot();
        assert_eq!(snapshot.pairs_matched, 1);
        assert!(snapshot.cards[0].is_matched && snapshot.cards[0].is_revealed);
        assert!(snapshot.cards[1].is_matched && snapshot.cards[1].is_revealed);
        assert_eq!(snapshot.phase, TurnPhase::Idle);
    }

    #[test]
    fn flipping_matched_or_revealed_cards_changes_nothing() {
        let (mut session, _) = session();
        session.flip_card(0);
        session.flip_card(1);
        session.flip_card(2);
        let before = session.snapshot();

        for index in [0, 1, 2] {
            assert_eq!(session.flip_card(index), FlipOutcome::Ignored);
        }
        assert_eq!(session.flip_card(99), FlipOutcome::Ignored);
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn mismatch_locks_until_deferred_unlock() {
        let (mut session, _) = session();
        session.flip_card(2);
        let FlipOutcome::Mismatched { unlock, .. } = session.flip_card(3) else {
            panic!("expected a mismatch");
        };
        assert_eq!(unlock.delay, Duration::from_millis(1_000));
        assert_eq!(unlock.action, DeferredAction::HideMismatch);
        assert_eq!(session.phase(), TurnPhase::Locked(LockReason::Mismatch));

        // A third card cannot join the two revealed ones.
        assert_eq!(session.flip_card(6), FlipOutcome::Ignored);

        assert!(session.apply_deferred(unlock));
        let snapshot = session.snapshot();
        assert!(!snapshot.cards[2].is_revealed);
        assert!(!snapshot.cards[3].is_revealed);
        assert_eq!(snapshot.pairs_matched, 0);
        assert_eq!(snapshot.phase, TurnPhase::Idle);

        // Applying twice is a no-op.
        assert!(!session.apply_deferred(unlock));
    }

    #[test]
    fn deferred_work_from_before_reset_is_stale() {
        let (mut session, _) = session();
        session.flip_card(2);
        let FlipOutcome::Mismatched { unlock, .. } = session.flip_card(3) else {
            panic!("expected a mismatch");
        };

        session.reset_with_board(Board::from_values(&LAYOUT).unwrap());
        session.mark_entry_paid();
        session.flip_card(2);

        assert!(!session.apply_deferred(unlock));
        assert!(session.snapshot().cards[2].is_revealed);
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn full_solve_completes_and_stops_the_timer() {
        let (mut session, clock) = session();
        session.flip_card(0);
        clock.advance(Duration::from_millis(30_000));
        session.flip_card(1);
        for (a, b) in [(2, 4), (3, 5), (6, 7), (8, 9), (10, 11), (12, 13)] {
            session.flip_card(a);
            session.flip_card(b);
        }
        assert!(!session.snapshot().is_complete);

        session.flip_card(14);
        let outcome = session.flip_card(15);
        assert!(outcome.completed());

        let snapshot = session.snapshot();
        assert!(snapshot.is_complete);
        assert!(!snapshot.is_running);
        assert_eq!(snapshot.pairs_matched, 8);
        assert_eq!(snapshot.phase, TurnPhase::Complete);
        assert_eq!(snapshot.elapsed_ms, 30_000);
        assert_eq!(snapshot.final_time_ms, Some(30_000));

        clock.advance(Duration::from_millis(10_000));
        assert!(!session.sample_elapsed());
        for index in 0..16 {
            assert_eq!(session.flip_card(index), FlipOutcome::Ignored);
        }
        assert_eq!(session.use_peek(), PowerUpOutcome::Ignored);
        assert_eq!(session.use_auto_match(), PowerUpOutcome::Ignored);
        assert_eq!(session.snapshot(), snapshot);
    }

    #[test]
    fn peek_before_first_flip_is_free() {
        let (mut session, _) = session();
        let PowerUpOutcome::Peeked { end, penalty_ms } = session.use_peek() else {
            panic!("expected a peek");
        };
        assert_eq!(penalty_ms, 0);
        assert_eq!(end.delay, Duration::from_millis(2_000));
        assert!(session.snapshot().cards.iter().all(|card| card.is_revealed));
        assert_eq!(session.phase(), TurnPhase::Locked(LockReason::Peek));
        assert_eq!(session.flip_card(0), FlipOutcome::Ignored);

        assert!(session.apply_deferred(end));
        let snapshot = session.snapshot();
        assert!(snapshot.cards.iter().all(|card| !card.is_revealed));
        assert_eq!(snapshot.penalties_ms, 0);
        assert!(!snapshot.is_running);
    }

    #[test]
    fn peek_after_first_flip_accumulates_penalties() {
        let (mut session, _) = session();
        session.flip_card(0);
        session.flip_card(1);

        for expected in [5_000, 10_000, 15_000] {
            let PowerUpOutcome::Peeked { end, penalty_ms } = session.use_peek() else {
                panic!("expected a peek");
            };
            assert_eq!(penalty_ms, 5_000);
            assert!(session.apply_deferred(end));
            assert_eq!(session.snapshot().penalties_ms, expected);
        }

        let snapshot = session.snapshot();
        assert!(snapshot.cards[0].is_revealed && snapshot.cards[1].is_revealed);
        assert!(snapshot.cards[2..].iter().all(|card| !card.is_revealed));
    }

    #[test]
    fn peek_during_mismatch_supersedes_the_cooldown() {
        let (mut session, _) = session();
        session.flip_card(2);
        let FlipOutcome::Mismatched { unlock, .. } = session.flip_card(3) else {
            panic!("expected a mismatch");
        };
        let PowerUpOutcome::Peeked { end, .. } = session.use_peek() else {
            panic!("expected a peek");
        };

        // The cooldown firing mid-peek must not hide anything.
        assert!(!session.apply_deferred(unlock));
        assert!(session.snapshot().cards.iter().all(|card| card.is_revealed));

        assert!(session.apply_deferred(end));
        assert_eq!(session.phase(), TurnPhase::Idle);
    }

    #[test]
    fn auto_match_matches_one_pair_and_charges_after_first_flip() {
        let (mut session, _) = session();
        let mut rng = StdRng::seed_from_u64(3);

        let PowerUpOutcome::AutoMatched {
            value, penalty_ms, ..
        } = session.use_auto_match_with(&mut rng)
        else {
            panic!("expected an auto-match");
        };
        assert_eq!(penalty_ms, 0);
        let matched: Vec<_> = session
            .snapshot()
            .cards
            .into_iter()
            .filter(|card| card.is_matched)
            .collect();
        assert_eq!(matched.len(), 2);
        assert!(matched.iter().all(|card| card.value == value && card.is_revealed));

        let free = (0..16)
            .find(|index| !session.snapshot().cards[*index].is_matched)
            .unwrap();
        session.flip_card(free);
        let PowerUpOutcome::AutoMatched { penalty_ms, .. } = session.use_auto_match_with(&mut rng)
        else {
            panic!("expected an auto-match");
        };
        assert_eq!(penalty_ms, 5_000);
        assert_eq!(session.snapshot().pairs_matched, 2);
        assert_eq!(session.snapshot().penalties_ms, 5_000);
    }

    #[test]
    fn auto_match_can_finish_the_game() {
        let (mut session, clock) = session();
        session.flip_card(0);
        session.flip_card(1);
        clock.advance(Duration::from_millis(2_000));

        let mut last = PowerUpOutcome::Ignored;
        for _ in 0..7 {
            last = session.use_auto_match();
        }
        assert!(last.completed());

        let snapshot = session.snapshot();
        assert!(snapshot.is_complete);
        assert_eq!(snapshot.penalties_ms, 35_000);
        assert_eq!(snapshot.final_time_ms, Some(37_000));
        assert_eq!(session.use_auto_match(), PowerUpOutcome::Ignored);
        assert_eq!(session.snapshot().penalties_ms, 35_000);
    }

    #[test]
    fn inventory_use_consumes_a_charge_and_applies_the_effect() {
        let (mut session, _) = session();
        assert_eq!(
            session.use_from_inventory(PowerUpKind::Peek),
            PowerUpOutcome::Ignored
        );

        session.set_inventory_counts(1.0, 2.7);
        assert!(session.use_from_inventory(PowerUpKind::AutoMatch).applied());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.inventory.auto_match, 1);
        assert_eq!(snapshot.pairs_matched, 1);

        assert!(session.use_from_inventory(PowerUpKind::Peek).applied());
        assert_eq!(session.snapshot().inventory.peek, 0);
        assert_eq!(
            session.use_from_inventory(PowerUpKind::Peek),
            PowerUpOutcome::Ignored
        );
    }

    #[test]
    fn completed_session_keeps_its_inventory() {
        let (mut session, _) = session();
        solve(&mut session);
        session.add_to_inventory(PowerUpKind::Peek, 2);

        assert_eq!(
            session.use_from_inventory(PowerUpKind::Peek),
            PowerUpOutcome::Ignored
        );
        assert_eq!(session.snapshot().inventory.peek, 2);
    }

    #[test]
    fn reset_clears_everything() {
        let (mut session, _) = session();
        session.add_to_inventory(PowerUpKind::Peek, 3);
        session.flip_card(0);
        session.flip_card(1);
        session.use_peek();

        session.reset();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.pairs_matched, 0);
        assert_eq!(snapshot.penalties_ms, 0);
        assert_eq!(snapshot.elapsed_ms, 0);
        assert_eq!(snapshot.inventory, Inventory::default());
        assert!(!snapshot.has_entry_paid);
        assert!(!snapshot.is_running);
        assert!(!snapshot.first_flip_happened);
        assert_eq!(snapshot.started_at_ms, None);
        assert_eq!(snapshot.phase, TurnPhase::Idle);
        assert!(snapshot.cards.iter().all(|card| !card.is_revealed));
    }

    #[test]
    fn walkthrough_match_mismatch_then_peek() {
        let (mut session, _) = session();

        session.flip_card(0);
        session.flip_card(1);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.pairs_matched, 1);
        assert_eq!(snapshot.penalties_ms, 0);
        assert!(snapshot.is_running);

        session.flip_card(2);
        let FlipOutcome::Mismatched { unlock, .. } = session.flip_card(3) else {
            panic!("expected a mismatch");
        };
        assert!(session.apply_deferred(unlock));
        let snapshot = session.snapshot();
        assert!(!snapshot.cards[2].is_revealed && !snapshot.cards[3].is_revealed);
        assert_eq!(snapshot.pairs_matched, 1);

        let PowerUpOutcome::Peeked { end, .. } = session.use_peek() else {
            panic!("expected a peek");
        };
        let snapshot = session.snapshot();
        assert!(snapshot.cards.iter().all(|card| card.is_revealed));
        assert_eq!(snapshot.penalties_ms, 5_000);
        assert_eq!(snapshot.pairs_matched, 1);
        assert_eq!(end.delay, Duration::from_millis(2_000));
    }
}
