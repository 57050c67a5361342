use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::ScoreEntity,
        play_store::PlayCompletion,
    },
    dto::play::ScoreSubmission,
    error::ServiceError,
    services::user_service,
    state::{SharedState, clock::ms_to_system_time},
};

/// Data sent when a play finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitScore {
    /// Completion instant, in epoch milliseconds.
    pub end_time_ms: Option<u64>,
    /// Final time measured by the client, penalties included.
    pub client_final_time_ms: Option<i64>,
    /// Display name to store with the score.
    pub username: Option<String>,
}

/// Record the final time of a play and write its leaderboard row.
///
/// A client-measured final time is accepted as is. Without one the time is
/// recomputed from the stored start instant and the power-up counters.
/// Durable inventory is left alone: stocked charges are deducted when used.
pub async fn submit_score(
    state: &SharedState,
    play_id: Uuid,
    request: SubmitScore,
) -> Result<ScoreSubmission, ServiceError> {
    if request.end_time_ms.is_none() && request.client_final_time_ms.is_none() {
        return Err(ServiceError::InvalidInput(
            "either an end time or a client final time is required".into(),
        ));
    }

    let store = state.play_store();
    let Some(play) = store.find_play(play_id).await? else {
        return Err(ServiceError::NotFound(format!("play `{play_id}` not found")));
    };

    let penalty_ms = state.config().timings.powerup_penalty.as_millis() as u64;
    let penalties_ms = u64::from(play.powerups_peek + play.powerups_auto) * penalty_ms;
    let end_time = request
        .end_time_ms
        .map(ms_to_system_time)
        .unwrap_or_else(|| ms_to_system_time(state.clock().now_ms()));

    let final_time_ms = match request.client_final_time_ms {
        Some(client) => client.max(0) as u64,
        None => {
            let Some(start) = play.start_time else {
                return Err(ServiceError::InvalidState(format!(
                    "play `{play_id}` has no recorded start"
                )));
            };
            let elapsed = end_time.duration_since(start).unwrap_or_default();
            elapsed.as_millis() as u64 + penalties_ms
        }
    };

    store
        .finish_play(
            play_id,
            PlayCompletion {
                end_time,
                final_time_ms,
                penalties_ms,
            },
        )
        .await?;

    let user = user_service::upsert_user(state, &play.user_id, request.username).await?;

    store
        .insert_score(ScoreEntity {
            id: Uuid::new_v4(),
            user_id: play.user_id.clone(),
            username: Some(user.username),
            final_time_ms,
            created_at: end_time,
        })
        .await?;

    info!(
        %play_id,
        user_id = %play.user_id,
        final_time_ms,
        penalties_ms,
        "score submitted"
    );

    Ok(ScoreSubmission {
        final_time_ms,
        penalties_ms,
    })
}
