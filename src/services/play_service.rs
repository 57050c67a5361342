use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::PlayEntity,
    dto::{
        play::{
            EntryResponse, FlipResponse, FlipResult, PlaySnapshot, PowerUpResponse,
            PurchaseResponse, ScoreSubmission,
        },
        validation::validate_wallet_address,
    },
    error::ServiceError,
    payments::TransferRequest,
    services::{
        inventory_sync::{record_usage, spawn_inventory_delta},
        retry::with_linear_backoff,
        score_service::{self, SubmitScore},
    },
    state::{
        SharedState,
        clock::ms_to_system_time,
        inventory::PowerUpKind,
        runtime::SessionRuntime,
        session::{FlipMatchSession, SessionSnapshot},
        state_machine::PowerUpOutcome,
    },
};

/// Open a play for `user_id`: persist it and register a fresh session hydrated from the user's stock.
pub async fn start_play(state: &SharedState, user_id: String) -> Result<PlaySnapshot, ServiceError> {
    validate_wallet_address(&user_id).map_err(|err| {
        ServiceError::InvalidInput(format!("invalid user id `{user_id}`: {}", err.code))
    })?;

    let store = state.play_store();
    let user = store.upsert_user(user_id.clone(), None).await?;
    let play = PlayEntity::new(user_id.clone(), ms_to_system_time(state.clock().now_ms()));
    let play_id = play.id;
    store.create_play(play).await?;

    let timings = state.config().timings;
    let session = FlipMatchSession::new(timings, state.clock());
    let runtime = SessionRuntime::new(play_id, user_id, session, timings.sample_interval);
    let snapshot = runtime
        .set_inventory_counts(f64::from(user.peek_count), f64::from(user.auto_match_count))
        .await;
    state.sessions().insert(play_id, Arc::clone(&runtime));

    info!(%play_id, user_id = %runtime.user_id(), "play started");
    Ok(PlaySnapshot::new(play_id, runtime.user_id(), &snapshot))
}

/// Charge the entry fee and unlock flipping.
pub async fn pay_entry(state: &SharedState, play_id: Uuid) -> Result<EntryResponse, ServiceError> {
    let runtime = state.require_session(play_id)?;
    if runtime.snapshot().await.has_entry_paid {
        return Err(ServiceError::InvalidState(format!(
            "entry fee for play `{play_id}` already paid"
        )));
    }

    let economy = &state.config().economy;
    let receipt = state
        .payments()
        .transfer(TransferRequest {
            from: runtime.user_id().to_owned(),
            to: economy.treasury_address.clone(),
            amount_cents: economy.entry_fee_cents,
        })
        .await
        .inspect_err(|err| warn!(%play_id, error = %err, "entry fee payment failed"))?;

    let snapshot = runtime.mark_entry_paid().await;
    info!(%play_id, tx_hash = %receipt.tx_hash, "entry fee paid");
    Ok(EntryResponse {
        receipt,
        play: view(&runtime, &snapshot),
    })
}

/// Flip the card at `index`.
///
/// The first flip reports the start instant to the store in the background;
/// the flip that completes the board submits the score.
pub async fn flip(
    state: &SharedState,
    play_id: Uuid,
    index: usize,
) -> Result<FlipResponse, ServiceError> {
    let runtime = state.require_session(play_id)?;
    let (outcome, snapshot) = runtime.flip(index).await;
    debug!(%play_id, index, ?outcome, "flip");

    if outcome.started_timer() {
        if let Some(started_at_ms) = snapshot.started_at_ms {
            spawn_mark_start(state, play_id, started_at_ms);
        }
    }

    let score = if outcome.completed() {
        submit_final_time(state, &runtime, &snapshot).await
    } else {
        None
    };

    Ok(FlipResponse {
        result: FlipResult::from(&outcome),
        score,
        play: view(&runtime, &snapshot),
    })
}

/// Spend one stocked charge of `kind`.
///
/// Refused until the entry fee is paid. Direct use without a stocked charge
/// only happens through [`purchase_powerup`].
pub async fn use_powerup(
    state: &SharedState,
    play_id: Uuid,
    kind: PowerUpKind,
) -> Result<PowerUpResponse, ServiceError> {
    let runtime = state.require_session(play_id)?;
    if !runtime.snapshot().await.has_entry_paid {
        return Err(ServiceError::InvalidState(format!(
            "entry fee for play `{play_id}` not paid"
        )));
    }
    let (outcome, snapshot) = apply_powerup(state, &runtime, kind, true).await;

    let score = if outcome.completed() {
        submit_final_time(state, &runtime, &snapshot).await
    } else {
        None
    };

    Ok(PowerUpResponse {
        applied: outcome.applied(),
        penalty_ms: penalty_of(&outcome),
        score,
        play: view(&runtime, &snapshot),
    })
}

/// Buy one charge of `kind`.
///
/// During a running game the charge is used immediately; otherwise, or when
/// the immediate use has no effect, it is stocked and persisted.
pub async fn purchase_powerup(
    state: &SharedState,
    play_id: Uuid,
    kind: PowerUpKind,
) -> Result<PurchaseResponse, ServiceError> {
    let runtime = state.require_session(play_id)?;
    let receipt = state
        .payments()
        .transfer(TransferRequest {
            from: runtime.user_id().to_owned(),
            to: state.config().economy.treasury_address.clone(),
            amount_cents: state.config().powerup_price_cents(kind),
        })
        .await
        .inspect_err(|err| warn!(%play_id, ?kind, error = %err, "power-up payment failed"))?;
    info!(%play_id, ?kind, tx_hash = %receipt.tx_hash, "power-up purchased");

    if runtime.is_in_game().await {
        let (outcome, snapshot) = apply_powerup(state, &runtime, kind, false).await;
        if outcome.applied() {
            let score = if outcome.completed() {
                submit_final_time(state, &runtime, &snapshot).await
            } else {
                None
            };
            return Ok(PurchaseResponse {
                receipt,
                used_immediately: true,
                score,
                play: view(&runtime, &snapshot),
            });
        }
        debug!(%play_id, ?kind, "purchased power-up had no effect; stocking it");
    }

    let snapshot = runtime.add_to_inventory(kind, 1).await;
    spawn_inventory_delta(state.play_store(), runtime.user_id().to_owned(), kind, 1);
    Ok(PurchaseResponse {
        receipt,
        used_immediately: false,
        score: None,
        play: view(&runtime, &snapshot),
    })
}

/// Deal a new board under a fresh play record.
///
/// The live session moves to the new play id and `play_id` stops resolving.
/// The entry fee must be paid again and the stock is reloaded from the store.
pub async fn reset(state: &SharedState, play_id: Uuid) -> Result<PlaySnapshot, ServiceError> {
    let Some((_, runtime)) = state.sessions().remove(&play_id) else {
        return Err(ServiceError::NotFound(format!(
            "play `{play_id}` has no live session"
        )));
    };

    let play = PlayEntity::new(
        runtime.user_id().to_owned(),
        ms_to_system_time(state.clock().now_ms()),
    );
    let next_id = play.id;
    if let Err(err) = state.play_store().create_play(play).await {
        state.sessions().insert(play_id, runtime);
        return Err(err.into());
    }

    let mut snapshot = runtime.reset(next_id).await;
    state.sessions().insert(next_id, Arc::clone(&runtime));

    match state
        .play_store()
        .find_user(runtime.user_id().to_owned())
        .await
    {
        Ok(Some(user)) => {
            snapshot = runtime
                .set_inventory_counts(f64::from(user.peek_count), f64::from(user.auto_match_count))
                .await;
        }
        Ok(None) => {}
        Err(err) => warn!(%play_id, error = %err, "failed to reload inventory after reset"),
    }

    info!(%play_id, %next_id, generation = snapshot.generation, "play reset");
    Ok(view(&runtime, &snapshot))
}

/// Current state of a play.
pub async fn snapshot(state: &SharedState, play_id: Uuid) -> Result<PlaySnapshot, ServiceError> {
    let runtime = state.require_session(play_id)?;
    let snapshot = runtime.snapshot().await;
    Ok(view(&runtime, &snapshot))
}

/// Session to follow for every snapshot published on a play.
pub fn subscribe(state: &SharedState, play_id: Uuid) -> Result<Arc<SessionRuntime>, ServiceError> {
    state.require_session(play_id)
}

/// Drop the in-memory session, cancelling its scheduled work.
pub fn end_play(state: &SharedState, play_id: Uuid) -> Result<(), ServiceError> {
    match state.sessions().remove(&play_id) {
        Some(_) => {
            info!(%play_id, "play ended");
            Ok(())
        }
        None => Err(ServiceError::NotFound(format!(
            "play `{play_id}` has no live session"
        ))),
    }
}

async fn apply_powerup(
    state: &SharedState,
    runtime: &Arc<SessionRuntime>,
    kind: PowerUpKind,
    from_inventory: bool,
) -> (PowerUpOutcome, SessionSnapshot) {
    let (outcome, snapshot) = runtime.use_powerup(kind, from_inventory).await;
    if outcome.applied() {
        let store = state.play_store();
        if from_inventory {
            spawn_inventory_delta(Arc::clone(&store), runtime.user_id().to_owned(), kind, -1);
        }
        // Score submission reads penalties back from these counters.
        record_usage(store.as_ref(), runtime.play_id(), kind, from_inventory).await;
    }
    debug!(play_id = %runtime.play_id(), ?kind, from_inventory, ?outcome, "power-up");
    (outcome, snapshot)
}

fn spawn_mark_start(state: &SharedState, play_id: Uuid, started_at_ms: u64) {
    let store = state.play_store();
    let policy = state.config().retry;
    let started_at = ms_to_system_time(started_at_ms);
    tokio::spawn(async move {
        let result = with_linear_backoff(policy, "mark_start", || {
            store.record_play_start(play_id, started_at)
        })
        .await;
        match result {
            Ok(Some(_)) => debug!(%play_id, started_at_ms, "play start recorded"),
            Ok(None) => warn!(%play_id, "cannot record start of an unknown play"),
            Err(err) => warn!(%play_id, error = %err, "giving up on recording play start"),
        }
    });
}

/// Submit the frozen final time of a paid play; failures are logged and leave the score unset.
async fn submit_final_time(
    state: &SharedState,
    runtime: &SessionRuntime,
    snapshot: &SessionSnapshot,
) -> Option<ScoreSubmission> {
    let play_id = runtime.play_id();
    let final_time_ms = snapshot.final_time_ms?;
    if !snapshot.has_entry_paid {
        warn!(%play_id, final_time_ms, "board completed without an entry fee; score not recorded");
        return None;
    }
    let request = SubmitScore {
        end_time_ms: Some(state.clock().now_ms()),
        client_final_time_ms: Some(final_time_ms.min(i64::MAX as u64) as i64),
        username: None,
    };
    match score_service::submit_score(state, play_id, request).await {
        Ok(score) => Some(score),
        Err(err) => {
            warn!(%play_id, final_time_ms, error = %err, "failed to submit score");
            None
        }
    }
}

fn penalty_of(outcome: &PowerUpOutcome) -> u64 {
    match outcome {
        PowerUpOutcome::Ignored => 0,
        PowerUpOutcome::Peeked { penalty_ms, .. }
        | PowerUpOutcome::AutoMatched { penalty_ms, .. } => *penalty_ms,
    }
}

fn view(runtime: &SessionRuntime, snapshot: &SessionSnapshot) -> PlaySnapshot {
    PlaySnapshot::new(runtime.play_id(), runtime.user_id(), snapshot)
}
