use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dao::models::{InventoryDelta, UserEntity};
use crate::dto::validation::{validate_username, validate_wallet_address};

/// User id taken from the request path.
#[derive(Debug)]
pub struct UserPath(pub String);

impl Validate for UserPath {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_wallet_address(&self.0) {
            errors.add("id", e);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Public view of a player.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// Wallet address.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Durable peek charges.
    pub peek_count: u32,
    /// Durable auto-match charges.
    pub auto_match_count: u32,
}

impl From<UserEntity> for UserView {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id,
            username: user.username,
            peek_count: user.peek_count,
            auto_match_count: user.auto_match_count,
        }
    }
}

/// Payload for `PUT /users/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpsertUserRequest {
    /// New display name; the current or default one is kept when omitted.
    #[serde(default)]
    pub username: Option<String>,
}

impl Validate for UpsertUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(ref username) = self.username {
            if let Err(e) = validate_username(username) {
                errors.add("username", e);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Payload for `PUT /users/{id}/username`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUsernameRequest {
    /// New display name, 1 to 20 characters.
    pub username: String,
}

/// Result of a rename.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsernameUpdated {
    /// The renamed player.
    pub user: UserView,
    /// Score rows that now carry the new name.
    pub scores_updated: usize,
}

/// Payload for `POST /users/{id}/inventory`; at least one delta must be non-zero.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAdjustmentRequest {
    /// Signed change to the peek stock.
    #[serde(default)]
    pub peek_delta: i64,
    /// Signed change to the auto-match stock.
    #[serde(default)]
    pub auto_match_delta: i64,
}

impl From<InventoryAdjustmentRequest> for InventoryDelta {
    fn from(request: InventoryAdjustmentRequest) -> Self {
        Self {
            peek: request.peek_delta,
            auto_match: request.auto_match_delta,
        }
    }
}
