use std::{
    future::Future,
    sync::{Arc, PoisonError, RwLock, Weak},
    time::Duration,
};

use tokio::{
    sync::{Mutex, watch},
    task::JoinSet,
    time::{MissedTickBehavior, interval, sleep},
};
use tracing::debug;
use uuid::Uuid;

use crate::state::{
    inventory::PowerUpKind,
    session::{FlipMatchSession, SessionSnapshot},
    state_machine::{Deferred, FlipOutcome, PowerUpOutcome},
};

/// Owns one [`FlipMatchSession`] and runs its deferred callbacks and timer sampler.
///
/// Every mutation publishes a fresh [`SessionSnapshot`] on a watch channel.
/// Scheduled tasks hold only a weak reference to the runtime and are aborted
/// on reset and when the runtime is dropped. Each reset binds the session to a
/// new play record.
pub struct SessionRuntime {
    play_id: RwLock<Uuid>,
    user_id: String,
    sample_interval: Duration,
    session: Mutex<FlipMatchSession>,
    snapshots: watch::Sender<SessionSnapshot>,
    tasks: std::sync::Mutex<JoinSet<()>>,
}

impl SessionRuntime {
    /// Wrap a session for the given play.
    pub fn new(
        play_id: Uuid,
        user_id: String,
        session: FlipMatchSession,
        sample_interval: Duration,
    ) -> Arc<Self> {
        let (snapshots, _rx) = watch::channel(session.snapshot());
        Arc::new(Self {
            play_id: RwLock::new(play_id),
            user_id,
            sample_interval,
            session: Mutex::new(session),
            snapshots,
            tasks: std::sync::Mutex::new(JoinSet::new()),
        })
    }

    /// Play record this session is currently bound to.
    pub fn play_id(&self) -> Uuid {
        *self.play_id.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Owner of the play.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Current state of the session.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    /// Whether a purchase right now would be used immediately.
    pub async fn is_in_game(&self) -> bool {
        self.session.lock().await.is_in_game()
    }

    /// Flip a card, scheduling the mismatch cooldown and the timer sampler as needed.
    pub async fn flip(self: &Arc<Self>, index: usize) -> (FlipOutcome, SessionSnapshot) {
        let mut session = self.session.lock().await;
        let outcome = session.flip_card(index);

        if let FlipOutcome::Mismatched { unlock, .. } = outcome {
            self.schedule(unlock);
        }
        if outcome.started_timer() {
            self.start_sampler(session.generation());
        }

        let snapshot = self.publish(&session);
        (outcome, snapshot)
    }

    /// Use a power-up, either directly or by spending a stocked charge.
    pub async fn use_powerup(
        self: &Arc<Self>,
        kind: PowerUpKind,
        from_inventory: bool,
    ) -> (PowerUpOutcome, SessionSnapshot) {
        let mut session = self.session.lock().await;
        let outcome = if from_inventory {
            session.use_from_inventory(kind)
        } else {
            session.use_powerup(kind)
        };

        if let PowerUpOutcome::Peeked { end, .. } = outcome {
            self.schedule(end);
        }

        let snapshot = self.publish(&session);
        (outcome, snapshot)
    }

    /// Add stocked charges.
    pub async fn add_to_inventory(&self, kind: PowerUpKind, count: i64) -> SessionSnapshot {
        let mut session = self.session.lock().await;
        session.add_to_inventory(kind, count);
        self.publish(&session)
    }

    /// Seed the stock from durable counts.
    pub async fn set_inventory_counts(&self, peek: f64, auto_match: f64) -> SessionSnapshot {
        let mut session = self.session.lock().await;
        session.set_inventory_counts(peek, auto_match);
        self.publish(&session)
    }

    /// Unlock flipping after the entry fee cleared.
    pub async fn mark_entry_paid(&self) -> SessionSnapshot {
        let mut session = self.session.lock().await;
        session.mark_entry_paid();
        self.publish(&session)
    }

    /// Cancel scheduled work, deal a new board and bind the session to `play_id`.
    pub async fn reset(&self, play_id: Uuid) -> SessionSnapshot {
        let mut session = self.session.lock().await;
        self.cancel_tasks();
        session.reset();
        *self.play_id.write().unwrap_or_else(PoisonError::into_inner) = play_id;
        self.publish(&session)
    }

    fn schedule(self: &Arc<Self>, deferred: Deferred) {
        let handle = Arc::downgrade(self);
        self.spawn(async move {
            sleep(deferred.delay).await;
            let Some(runtime) = handle.upgrade() else {
                return;
            };
            let mut session = runtime.session.lock().await;
            if session.apply_deferred(deferred) {
                runtime.publish(&session);
            } else {
                debug!(play_id = %runtime.play_id(), action = ?deferred.action, "stale deferred action ignored");
            }
        });
    }

    fn start_sampler(self: &Arc<Self>, generation: u64) {
        let handle: Weak<Self> = Arc::downgrade(self);
        let period = self.sample_interval;
        self.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(runtime) = handle.upgrade() else {
                    break;
                };
                let mut session = runtime.session.lock().await;
                if session.generation() != generation || !session.is_running() {
                    break;
                }
                if session.sample_elapsed() {
                    runtime.publish(&session);
                }
            }
        });
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        // Reap finished tasks so the set does not grow with every mismatch.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    fn cancel_tasks(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.abort_all();
        while tasks.try_join_next().is_some() {}
    }

    fn publish(&self, session: &FlipMatchSession) -> SessionSnapshot {
        let snapshot = session.snapshot();
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::GameTimings,
        state::{
            board::Board,
            clock::ManualClock,
            state_machine::{LockReason, TurnPhase},
        },
    };

    const LAYOUT: [u8; 16] = [0, 0, 1, 2, 1, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7];

    fn runtime(clock: Arc<ManualClock>) -> Arc<SessionRuntime> {
        let timings = GameTimings::default();
        let session =
            FlipMatchSession::with_board(Board::from_values(&LAYOUT).unwrap(), timings, clock);
        SessionRuntime::new(
            Uuid::new_v4(),
            "0xabc".into(),
            session,
            timings.sample_interval,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn mismatch_hides_cards_after_cooldown() {
        let runtime = runtime(Arc::new(ManualClock::new(0)));
        runtime.mark_entry_paid().await;

        runtime.flip(2).await;
        let (outcome, snapshot) = runtime.flip(3).await;
        assert!(matches!(outcome, FlipOutcome::Mismatched { .. }));
        assert_eq!(snapshot.phase, TurnPhase::Locked(LockReason::Mismatch));

        sleep(Duration::from_millis(900)).await;
        let snapshot = runtime.snapshot().await;
        assert!(snapshot.cards[2].is_revealed && snapshot.cards[3].is_revealed);

        sleep(Duration::from_millis(200)).await;
        let snapshot = runtime.snapshot().await;
        assert!(!snapshot.cards[2].is_revealed && !snapshot.cards[3].is_revealed);
        assert_eq!(snapshot.phase, TurnPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_pending_cooldown() {
        let runtime = runtime(Arc::new(ManualClock::new(0)));
        runtime.mark_entry_paid().await;
        runtime.flip(2).await;
        runtime.flip(3).await;

        let next = Uuid::new_v4();
        let snapshot = runtime.reset(next).await;
        assert_eq!(snapshot.generation, 1);
        assert_eq!(runtime.play_id(), next);
        runtime.mark_entry_paid().await;
        let index = snapshot.cards.iter().position(|card| !card.is_revealed).unwrap();
        runtime.flip(index).await;

        sleep(Duration::from_millis(1_500)).await;
        let snapshot = runtime.snapshot().await;
        assert!(snapshot.cards[index].is_revealed);
        assert_eq!(snapshot.phase, TurnPhase::OneRevealed);
    }

    #[tokio::test(start_paused = true)]
    async fn peek_window_closes_after_two_seconds() {
        let runtime = runtime(Arc::new(ManualClock::new(0)));
        runtime.mark_entry_paid().await;
        runtime.flip(0).await;
        runtime.flip(1).await;

        let (outcome, snapshot) = runtime.use_powerup(PowerUpKind::Peek, false).await;
        assert!(outcome.applied());
        assert_eq!(snapshot.penalties_ms, 5_000);
        assert!(snapshot.cards.iter().all(|card| card.is_revealed));

        sleep(Duration::from_millis(2_050)).await;
        let snapshot = runtime.snapshot().await;
        assert_eq!(
            snapshot.cards.iter().filter(|card| card.is_revealed).count(),
            2
        );
        assert_eq!(snapshot.phase, TurnPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn sampler_publishes_wall_clock_elapsed_time() {
        let clock = Arc::new(ManualClock::new(10_000));
        let runtime = runtime(clock.clone());
        let mut updates = runtime.subscribe();
        runtime.mark_entry_paid().await;
        runtime.flip(0).await;

        clock.advance(Duration::from_millis(750));
        sleep(Duration::from_millis(60)).await;

        assert!(updates.has_changed().unwrap());
        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(snapshot.elapsed_ms, 750);
        assert!(snapshot.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn inventory_use_goes_through_the_runtime() {
        let runtime = runtime(Arc::new(ManualClock::new(0)));
        runtime.set_inventory_counts(0.0, 1.0).await;
        assert!(!runtime.is_in_game().await);

        let (outcome, snapshot) = runtime.use_powerup(PowerUpKind::AutoMatch, true).await;
        assert!(outcome.applied());
        assert_eq!(snapshot.inventory.auto_match, 0);
        assert_eq!(snapshot.pairs_matched, 1);

        let (outcome, _) = runtime.use_powerup(PowerUpKind::AutoMatch, true).await;
        assert!(!outcome.applied());
    }
}
