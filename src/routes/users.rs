use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use axum_valid::Valid;
use validator::Validate;

use crate::{
    dto::user::{
        InventoryAdjustmentRequest, UpdateUsernameRequest, UpsertUserRequest, UserPath,
        UserView, UsernameUpdated,
    },
    error::AppError,
    services::user_service,
    state::SharedState,
};

/// Player account endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/users/{id}", get(get_user).put(upsert_user))
        .route("/users/{id}/username", put(update_username))
        .route("/users/{id}/inventory", post(adjust_inventory))
}

fn user_id(id: String) -> Result<String, AppError> {
    let path = UserPath(id);
    path.validate()?;
    Ok(path.0)
}

/// Fetch a player.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "Wallet address of the player")),
    responses(
        (status = 200, description = "Player", body = UserView),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, AppError> {
    let id = user_id(id)?;
    match user_service::get_user(&state, &id).await? {
        Some(user) => Ok(Json(user.into())),
        None => Err(AppError::NotFound(format!("user `{id}` not found"))),
    }
}

/// Create a player or rename it.
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "Wallet address of the player")),
    request_body = UpsertUserRequest,
    responses((status = 200, description = "Player", body = UserView))
)]
pub async fn upsert_user(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<UpsertUserRequest>>,
) -> Result<Json<UserView>, AppError> {
    let id = user_id(id)?;
    let user = user_service::upsert_user(&state, &id, payload.username).await?;
    Ok(Json(user.into()))
}

/// Rename a player and its leaderboard rows.
#[utoipa::path(
    put,
    path = "/users/{id}/username",
    tag = "users",
    params(("id" = String, Path, description = "Wallet address of the player")),
    request_body = UpdateUsernameRequest,
    responses(
        (status = 200, description = "Player renamed", body = UsernameUpdated),
        (status = 400, description = "Username must be 1 to 20 characters"),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn update_username(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUsernameRequest>,
) -> Result<Json<UsernameUpdated>, AppError> {
    let id = user_id(id)?;
    let (user, scores_updated) = user_service::update_username(&state, &id, payload.username).await?;
    Ok(Json(UsernameUpdated {
        user: user.into(),
        scores_updated,
    }))
}

/// Apply signed deltas to a player's power-up stock.
#[utoipa::path(
    post,
    path = "/users/{id}/inventory",
    tag = "users",
    params(("id" = String, Path, description = "Wallet address of the player")),
    request_body = InventoryAdjustmentRequest,
    responses(
        (status = 200, description = "Updated stock", body = UserView),
        (status = 400, description = "Both deltas are zero")
    )
)]
pub async fn adjust_inventory(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<InventoryAdjustmentRequest>,
) -> Result<Json<UserView>, AppError> {
    let id = user_id(id)?;
    let user = user_service::adjust_inventory(&state, &id, payload.into()).await?;
    Ok(Json(user.into()))
}
