use serde::Serialize;
use utoipa::ToSchema;

use crate::{dao::models::ScoreEntity, dto::format_system_time};

/// One ranked row of the leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1 for the fastest time.
    pub rank: usize,
    /// Wallet address of the player.
    pub user_id: String,
    /// Username, or a shortened wallet address when the player has none.
    pub display_name: String,
    /// Final time including penalties.
    pub final_time_ms: u64,
    /// RFC 3339 submission time.
    pub created_at: String,
}

impl LeaderboardEntry {
    pub fn new(rank: usize, display_name: String, score: ScoreEntity) -> Self {
        Self {
            rank,
            user_id: score.user_id,
            display_name,
            final_time_ms: score.final_time_ms,
            created_at: format_system_time(score.created_at),
        }
    }
}
