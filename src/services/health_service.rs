use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report service health, degraded when the play store fails its check.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let live_sessions = state.sessions().len();
    match state.play_store().health_check().await {
        Ok(()) => HealthResponse::ok(live_sessions),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded(live_sessions)
        }
    }
}
