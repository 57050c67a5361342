use serde::Serialize;
use utoipa::ToSchema;

/// One settled prize.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayoutLine {
    /// Leaderboard position for the day, from 1.
    pub rank: usize,
    /// Wallet that received the prize.
    pub user_id: String,
    /// Winning time.
    pub final_time_ms: u64,
    /// Prize amount.
    pub amount_cents: u64,
    /// Transfer reference returned by the gateway.
    pub tx_hash: String,
}

/// Outcome of a daily payout run.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayoutReport {
    /// UTC day, `YYYY-MM-DD`.
    pub day: String,
    /// Plays whose first flip fell inside the day.
    pub plays_started: u64,
    /// Entry fees collected for the day.
    pub pool_cents: u64,
    /// Part of the pool shared among winners.
    pub distributable_cents: u64,
    /// Empty when there was nothing to distribute.
    pub payouts: Vec<PayoutLine>,
}
