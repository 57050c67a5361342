use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::leaderboard::LeaderboardEntry, error::AppError, services::leaderboard_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    responses((status = 200, description = "Fastest scores first", body = [LeaderboardEntry]))
)]
/// Ranked top scores.
pub async fn leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    Ok(Json(leaderboard_service::top_scores(&state).await?))
}

/// Configure the leaderboard routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/leaderboard", get(leaderboard))
}
