use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Player account keyed by wallet address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Wallet address of the player.
    pub id: String,
    /// Display name shown on the leaderboard.
    pub username: String,
    /// Durable stock of peek charges.
    pub peek_count: u32,
    /// Durable stock of auto-match charges.
    pub auto_match_count: u32,
}

impl UserEntity {
    /// Name given to accounts that never picked one: `Player_` and six characters of the address.
    pub fn default_username(user_id: &str) -> String {
        let tag: String = user_id.chars().skip(2).take(6).collect();
        format!("Player_{tag}")
    }
}

/// One paid attempt at the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayEntity {
    /// Primary key of the play.
    pub id: Uuid,
    /// Owner of the play.
    pub user_id: String,
    /// When the play record was created.
    pub created_at: SystemTime,
    /// Earliest observed first-flip instant.
    pub start_time: Option<SystemTime>,
    /// When the score was submitted.
    pub end_time: Option<SystemTime>,
    /// Accepted final time.
    pub final_time_ms: Option<u64>,
    /// Penalties derived from power-up usage.
    pub penalties_ms: Option<u64>,
    /// Peeks used during the play, any source.
    pub powerups_peek: u32,
    /// Auto-matches used during the play, any source.
    pub powerups_auto: u32,
    /// Peeks taken from the durable inventory.
    pub inventory_peek_used: u32,
    /// Auto-matches taken from the durable inventory.
    pub inventory_auto_used: u32,
}

impl PlayEntity {
    /// Fresh play for `user_id`.
    pub fn new(user_id: String, created_at: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            created_at,
            start_time: None,
            end_time: None,
            final_time_ms: None,
            penalties_ms: None,
            powerups_peek: 0,
            powerups_auto: 0,
            inventory_peek_used: 0,
            inventory_auto_used: 0,
        }
    }
}

/// Leaderboard row written when a play is submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Primary key of the score.
    pub id: Uuid,
    /// Player that achieved the score.
    pub user_id: String,
    /// Display name at submission time, kept in sync on renames.
    pub username: Option<String>,
    /// Final time including penalties.
    pub final_time_ms: u64,
    /// Submission instant.
    pub created_at: SystemTime,
}

/// Signed changes to a user's durable power-up stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryDelta {
    /// Change to the peek stock.
    pub peek: i64,
    /// Change to the auto-match stock.
    pub auto_match: i64,
}

impl InventoryDelta {
    /// True when neither counter changes.
    pub fn is_empty(&self) -> bool {
        self.peek == 0 && self.auto_match == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_username_uses_address_prefix() {
        assert_eq!(
            UserEntity::default_username("0xAbCdEf0123456789"),
            "Player_AbCdEf"
        );
        assert_eq!(UserEntity::default_username("0x1"), "Player_1");
    }
}
