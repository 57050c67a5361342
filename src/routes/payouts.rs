use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payout::PayoutReport, error::AppError, services::payout_service, state::SharedState,
};

#[utoipa::path(
    post,
    path = "/payouts/daily",
    tag = "leaderboard",
    responses(
        (status = 200, description = "Prizes settled for the current UTC day", body = PayoutReport),
        (status = 402, description = "A transfer was refused; the batch stopped")
    )
)]
/// Distribute today's prize pool.
pub async fn daily_payout(
    State(state): State<SharedState>,
) -> Result<Json<PayoutReport>, AppError> {
    Ok(Json(payout_service::run_daily_payout(&state).await?))
}

/// Configure the payout routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/payouts/daily", post(daily_payout))
}
