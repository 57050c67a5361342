pub mod memory;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    dao::{
        models::{InventoryDelta, PlayEntity, ScoreEntity, UserEntity},
        storage::StorageResult,
    },
    state::inventory::PowerUpKind,
};

/// Inclusive-exclusive time window used to filter plays and scores.
pub type TimeRange = (SystemTime, SystemTime);

/// Fields written when a play is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayCompletion {
    /// Submission instant.
    pub end_time: SystemTime,
    /// Accepted final time.
    pub final_time_ms: u64,
    /// Penalties derived from power-up usage.
    pub penalties_ms: u64,
}

/// Abstraction over the persistence layer for users, plays and scores.
pub trait PlayStore: Send + Sync {
    /// Create the user if missing and optionally set a new display name.
    fn upsert_user(
        &self,
        user_id: String,
        username: Option<String>,
    ) -> BoxFuture<'static, StorageResult<UserEntity>>;
    fn find_user(&self, user_id: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Rename an existing user and every score row they own; returns the number of rows touched.
    fn rename_user(
        &self,
        user_id: String,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<(UserEntity, usize)>>>;
    /// Apply a signed delta, creating the user with floored counts when absent.
    fn adjust_inventory(
        &self,
        user_id: String,
        delta: InventoryDelta,
    ) -> BoxFuture<'static, StorageResult<UserEntity>>;
    fn create_play(&self, play: PlayEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_play(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayEntity>>>;
    /// Record the first-flip instant, keeping the earliest one seen.
    fn record_play_start(
        &self,
        id: Uuid,
        at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<PlayEntity>>>;
    fn record_powerup(
        &self,
        id: Uuid,
        kind: PowerUpKind,
        from_inventory: bool,
    ) -> BoxFuture<'static, StorageResult<Option<PlayEntity>>>;
    fn finish_play(
        &self,
        id: Uuid,
        completion: PlayCompletion,
    ) -> BoxFuture<'static, StorageResult<Option<PlayEntity>>>;
    fn insert_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fastest scores first, optionally restricted to a creation window.
    fn top_scores(
        &self,
        limit: usize,
        range: Option<TimeRange>,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// Number of plays whose first flip falls inside the window.
    fn count_plays_started(&self, range: TimeRange) -> BoxFuture<'static, StorageResult<u64>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
