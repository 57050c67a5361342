use tracing::info;

use crate::{
    dao::models::{InventoryDelta, UserEntity},
    dto::validation::validate_username,
    error::ServiceError,
    state::SharedState,
};

/// Look up a user by wallet address.
pub async fn get_user(state: &SharedState, user_id: &str) -> Result<Option<UserEntity>, ServiceError> {
    Ok(state.play_store().find_user(user_id.to_owned()).await?)
}

/// Create the user if needed; a non-empty `username` renames it and its score rows.
pub async fn upsert_user(
    state: &SharedState,
    user_id: &str,
    username: Option<String>,
) -> Result<UserEntity, ServiceError> {
    let store = state.play_store();
    let user = store.upsert_user(user_id.to_owned(), None).await?;

    match username.map(|name| name.trim().to_owned()) {
        Some(name) if !name.is_empty() => {
            let (user, _) = rename(state, user_id, name).await?;
            Ok(user)
        }
        _ => Ok(user),
    }
}

/// Rename an existing user; returns the user and the number of score rows updated.
pub async fn update_username(
    state: &SharedState,
    user_id: &str,
    username: String,
) -> Result<(UserEntity, usize), ServiceError> {
    validate_username(&username).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|message| message.into_owned())
                .unwrap_or_else(|| "invalid username".into()),
        )
    })?;
    rename(state, user_id, username.trim().to_owned()).await
}

/// Apply signed deltas to the durable power-up stock.
pub async fn adjust_inventory(
    state: &SharedState,
    user_id: &str,
    delta: InventoryDelta,
) -> Result<UserEntity, ServiceError> {
    if delta.is_empty() {
        return Err(ServiceError::InvalidInput(
            "at least one inventory delta must be non-zero".into(),
        ));
    }
    let user = state
        .play_store()
        .adjust_inventory(user_id.to_owned(), delta)
        .await?;
    info!(
        %user_id,
        peek_delta = delta.peek,
        auto_match_delta = delta.auto_match,
        peek = user.peek_count,
        auto_match = user.auto_match_count,
        "inventory adjusted"
    );
    Ok(user)
}

async fn rename(
    state: &SharedState,
    user_id: &str,
    username: String,
) -> Result<(UserEntity, usize), ServiceError> {
    let Some((user, touched)) = state
        .play_store()
        .rename_user(user_id.to_owned(), username)
        .await?
    else {
        return Err(ServiceError::NotFound(format!("user `{user_id}` not found")));
    };
    info!(%user_id, username = %user.username, scores_updated = touched, "user renamed");
    Ok((user, touched))
}
