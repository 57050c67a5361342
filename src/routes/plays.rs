use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::play::{
        EntryResponse, FlipRequest, FlipResponse, PlaySnapshot, PowerUpResponse,
        PurchasePowerUpRequest, PurchaseResponse, StartPlayRequest, UsePowerUpRequest,
    },
    error::AppError,
    services::play_service,
    state::SharedState,
};

/// Play lifecycle endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/plays", post(start_play))
        .route("/plays/{id}", get(get_play).delete(end_play))
        .route("/plays/{id}/entry", post(pay_entry))
        .route("/plays/{id}/flip", post(flip))
        .route("/plays/{id}/powerups/use", post(use_powerup))
        .route("/plays/{id}/powerups/purchase", post(purchase_powerup))
        .route("/plays/{id}/reset", post(reset_play))
}

/// Open a new play for a wallet.
#[utoipa::path(
    post,
    path = "/plays",
    tag = "plays",
    request_body = StartPlayRequest,
    responses(
        (status = 201, description = "Play created", body = PlaySnapshot),
        (status = 400, description = "Invalid wallet address")
    )
)]
pub async fn start_play(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<StartPlayRequest>>,
) -> Result<(StatusCode, Json<PlaySnapshot>), AppError> {
    let play = play_service::start_play(&state, payload.user_id).await?;
    Ok((StatusCode::CREATED, Json(play)))
}

/// Current state of a play.
#[utoipa::path(
    get,
    path = "/plays/{id}",
    tag = "plays",
    params(("id" = Uuid, Path, description = "Identifier of the play")),
    responses((status = 200, description = "Play snapshot", body = PlaySnapshot))
)]
pub async fn get_play(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlaySnapshot>, AppError> {
    Ok(Json(play_service::snapshot(&state, id).await?))
}

/// Drop a play's live session.
#[utoipa::path(
    delete,
    path = "/plays/{id}",
    tag = "plays",
    params(("id" = Uuid, Path, description = "Identifier of the play")),
    responses((status = 204, description = "Session dropped"))
)]
pub async fn end_play(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    play_service::end_play(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pay the entry fee to unlock the board.
#[utoipa::path(
    post,
    path = "/plays/{id}/entry",
    tag = "plays",
    params(("id" = Uuid, Path, description = "Identifier of the play")),
    responses(
        (status = 200, description = "Entry fee paid", body = EntryResponse),
        (status = 402, description = "Payment refused"),
        (status = 409, description = "Entry fee already paid")
    )
)]
pub async fn pay_entry(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EntryResponse>, AppError> {
    Ok(Json(play_service::pay_entry(&state, id).await?))
}

/// Flip one card.
#[utoipa::path(
    post,
    path = "/plays/{id}/flip",
    tag = "plays",
    params(("id" = Uuid, Path, description = "Identifier of the play")),
    request_body = FlipRequest,
    responses((status = 200, description = "Flip processed", body = FlipResponse))
)]
pub async fn flip(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<FlipRequest>>,
) -> Result<Json<FlipResponse>, AppError> {
    Ok(Json(play_service::flip(&state, id, payload.index).await?))
}

/// Spend a stocked power-up charge. The entry fee must be paid.
#[utoipa::path(
    post,
    path = "/plays/{id}/powerups/use",
    tag = "plays",
    params(("id" = Uuid, Path, description = "Identifier of the play")),
    request_body = UsePowerUpRequest,
    responses(
        (status = 200, description = "Power-up processed", body = PowerUpResponse),
        (status = 409, description = "Entry fee not paid", body = String)
    )
)]
pub async fn use_powerup(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UsePowerUpRequest>,
) -> Result<Json<PowerUpResponse>, AppError> {
    Ok(Json(
        play_service::use_powerup(&state, id, payload.kind).await?,
    ))
}

/// Buy a power-up.
#[utoipa::path(
    post,
    path = "/plays/{id}/powerups/purchase",
    tag = "plays",
    params(("id" = Uuid, Path, description = "Identifier of the play")),
    request_body = PurchasePowerUpRequest,
    responses(
        (status = 200, description = "Power-up bought", body = PurchaseResponse),
        (status = 402, description = "Payment refused")
    )
)]
pub async fn purchase_powerup(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PurchasePowerUpRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    Ok(Json(
        play_service::purchase_powerup(&state, id, payload.kind).await?,
    ))
}

/// Deal a new board under a fresh play id; the old id stops resolving.
#[utoipa::path(
    post,
    path = "/plays/{id}/reset",
    tag = "plays",
    params(("id" = Uuid, Path, description = "Identifier of the play")),
    responses((status = 200, description = "Board reset onto a new play", body = PlaySnapshot))
)]
pub async fn reset_play(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlaySnapshot>, AppError> {
    Ok(Json(play_service::reset(&state, id).await?))
}
