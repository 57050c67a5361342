use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::SystemTime,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    dao::{
        models::{InventoryDelta, PlayEntity, ScoreEntity, UserEntity},
        play_store::{PlayCompletion, PlayStore, TimeRange},
        storage::{StorageError, StorageResult},
    },
    state::inventory::PowerUpKind,
};

/// Process-local [`PlayStore`] used by the server binary and the test-suite.
#[derive(Clone, Default)]
pub struct MemoryPlayStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    offline: AtomicBool,
    users: DashMap<String, UserEntity>,
    plays: DashMap<Uuid, PlayEntity>,
    scores: RwLock<Vec<ScoreEntity>>,
}

impl MemoryPlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with [`StorageError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn run<T, F>(&self, operation: &'static str, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Inner) -> StorageResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.ensure_online(operation)?;
            f(&inner)
        })
    }
}

impl Inner {
    fn ensure_online(&self, operation: &'static str) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                format!("{operation} failed"),
                io::Error::new(io::ErrorKind::NotConnected, "store is offline"),
            ));
        }
        Ok(())
    }

    fn update_play<F>(&self, id: Uuid, f: F) -> Option<PlayEntity>
    where
        F: FnOnce(&mut PlayEntity),
    {
        self.plays.get_mut(&id).map(|mut entry| {
            f(entry.value_mut());
            entry.value().clone()
        })
    }
}

fn saturating_apply(count: u32, delta: i64) -> u32 {
    let next = i64::from(count).saturating_add(delta);
    next.clamp(0, i64::from(u32::MAX)) as u32
}

fn in_range(at: SystemTime, range: Option<TimeRange>) -> bool {
    range.is_none_or(|(from, to)| at >= from && at < to)
}

impl PlayStore for MemoryPlayStore {
    fn upsert_user(
        &self,
        user_id: String,
        username: Option<String>,
    ) -> BoxFuture<'static, StorageResult<UserEntity>> {
        self.run("upsert_user", move |inner| {
            let mut entry = inner
                .users
                .entry(user_id.clone())
                .or_insert_with(|| UserEntity {
                    username: UserEntity::default_username(&user_id),
                    id: user_id,
                    peek_count: 0,
                    auto_match_count: 0,
                });
            if let Some(username) = username {
                entry.username = username;
            }
            Ok(entry.value().clone())
        })
    }

    fn find_user(&self, user_id: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        self.run("find_user", move |inner| {
            Ok(inner.users.get(&user_id).map(|entry| entry.value().clone()))
        })
    }

    fn rename_user(
        &self,
        user_id: String,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<(UserEntity, usize)>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.ensure_online("rename_user")?;
            let user = {
                let Some(mut entry) = inner.users.get_mut(&user_id) else {
                    return Ok(None);
                };
                entry.username = username.clone();
                entry.value().clone()
            };

            let mut scores = inner.scores.write().await;
            let mut touched = 0;
            for score in scores.iter_mut().filter(|score| score.user_id == user_id) {
                score.username = Some(username.clone());
                touched += 1;
            }
            Ok(Some((user, touched)))
        })
    }

    fn adjust_inventory(
        &self,
        user_id: String,
        delta: InventoryDelta,
    ) -> BoxFuture<'static, StorageResult<UserEntity>> {
        self.run("adjust_inventory", move |inner| {
            let mut entry = inner
                .users
                .entry(user_id.clone())
                .or_insert_with(|| UserEntity {
                    username: UserEntity::default_username(&user_id),
                    id: user_id,
                    peek_count: 0,
                    auto_match_count: 0,
                });
            entry.peek_count = saturating_apply(entry.peek_count, delta.peek);
            entry.auto_match_count = saturating_apply(entry.auto_match_count, delta.auto_match);
            Ok(entry.value().clone())
        })
    }

    fn create_play(&self, play: PlayEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run("create_play", move |inner| {
            if inner.plays.contains_key(&play.id) {
                return Err(StorageError::Corrupted {
                    id: play.id.to_string(),
                    reason: "play id already exists",
                });
            }
            inner.plays.insert(play.id, play);
            Ok(())
        })
    }

    fn find_play(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayEntity>>> {
        self.run("find_play", move |inner| {
            Ok(inner.plays.get(&id).map(|entry| entry.value().clone()))
        })
    }

    fn record_play_start(
        &self,
        id: Uuid,
        at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<PlayEntity>>> {
        self.run("record_play_start", move |inner| {
            Ok(inner.update_play(id, |play| {
                if play.start_time.is_none_or(|existing| at < existing) {
                    play.start_time = Some(at);
                }
            }))
        })
    }

    fn record_powerup(
        &self,
        id: Uuid,
        kind: PowerUpKind,
        from_inventory: bool,
    ) -> BoxFuture<'static, StorageResult<Option<PlayEntity>>> {
        self.run("record_powerup", move |inner| {
            Ok(inner.update_play(id, |play| match kind {
                PowerUpKind::Peek => {
                    play.powerups_peek += 1;
                    if from_inventory {
                        play.inventory_peek_used += 1;
                    }
                }
                PowerUpKind::AutoMatch => {
                    play.powerups_auto += 1;
                    if from_inventory {
                        play.inventory_auto_used += 1;
                    }
                }
            }))
        })
    }

    fn finish_play(
        &self,
        id: Uuid,
        completion: PlayCompletion,
    ) -> BoxFuture<'static, StorageResult<Option<PlayEntity>>> {
        self.run("finish_play", move |inner| {
            Ok(inner.update_play(id, |play| {
                play.end_time = Some(completion.end_time);
                play.final_time_ms = Some(completion.final_time_ms);
                play.penalties_ms = Some(completion.penalties_ms);
            }))
        })
    }

    fn insert_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.ensure_online("insert_score")?;
            inner.scores.write().await.push(score);
            Ok(())
        })
    }

    fn top_scores(
        &self,
        limit: usize,
        range: Option<TimeRange>,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.ensure_online("top_scores")?;
            let scores = inner.scores.read().await;
            let mut selected: Vec<ScoreEntity> = scores
                .iter()
                .filter(|score| in_range(score.created_at, range))
                .cloned()
                .collect();
            // Stable sort keeps submission order among equal times.
            selected.sort_by_key(|score| score.final_time_ms);
            selected.truncate(limit);
            Ok(selected)
        })
    }

    fn count_plays_started(&self, range: TimeRange) -> BoxFuture<'static, StorageResult<u64>> {
        self.run("count_plays_started", move |inner| {
            let count = inner
                .plays
                .iter()
                .filter(|entry| {
                    entry
                        .start_time
                        .is_some_and(|start| in_range(start, Some(range)))
                })
                .count();
            Ok(count as u64)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.run("health_check", |_| Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn at(ms: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_millis(ms)
    }

    fn score(user_id: &str, final_time_ms: u64, created_ms: u64) -> ScoreEntity {
        ScoreEntity {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            username: None,
            final_time_ms,
            created_at: at(created_ms),
        }
    }

    #[tokio::test]
    async fn upsert_creates_with_default_name_and_keeps_stock() {
        let store = MemoryPlayStore::new();
        let user = store.upsert_user("0xabcdef1234".into(), None).await.unwrap();
        assert_eq!(user.username, "Player_abcdef");

        store
            .adjust_inventory(
                "0xabcdef1234".into(),
                InventoryDelta {
                    peek: 2,
                    auto_match: 0,
                },
            )
            .await
            .unwrap();
        let user = store
            .upsert_user("0xabcdef1234".into(), Some("neo".into()))
            .await
            .unwrap();
        assert_eq!(user.username, "neo");
        assert_eq!(user.peek_count, 2);
    }

    #[tokio::test]
    async fn adjust_inventory_saturates_and_floors_new_users() {
        let store = MemoryPlayStore::new();
        let user = store
            .adjust_inventory(
                "0x1".into(),
                InventoryDelta {
                    peek: -3,
                    auto_match: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!((user.peek_count, user.auto_match_count), (0, 2));

        let user = store
            .adjust_inventory(
                "0x1".into(),
                InventoryDelta {
                    peek: 1,
                    auto_match: -5,
                },
            )
            .await
            .unwrap();
        assert_eq!((user.peek_count, user.auto_match_count), (1, 0));
    }

    #[tokio::test]
    async fn rename_cascades_to_scores() {
        let store = MemoryPlayStore::new();
        store.upsert_user("0x1".into(), None).await.unwrap();
        store.insert_score(score("0x1", 10, 0)).await.unwrap();
        store.insert_score(score("0x2", 20, 0)).await.unwrap();
        store.insert_score(score("0x1", 30, 0)).await.unwrap();

        let (user, touched) = store
            .rename_user("0x1".into(), "ada".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(touched, 2);

        let scores = store.top_scores(10, None).await.unwrap();
        assert_eq!(scores[0].username.as_deref(), Some("ada"));
        assert_eq!(scores[1].username, None);

        assert!(
            store
                .rename_user("0x9".into(), "ghost".into())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn play_start_keeps_the_earliest_instant() {
        let store = MemoryPlayStore::new();
        let play = PlayEntity::new("0x1".into(), at(0));
        let id = play.id;
        store.create_play(play).await.unwrap();

        store.record_play_start(id, at(500)).await.unwrap();
        store.record_play_start(id, at(900)).await.unwrap();
        let play = store.record_play_start(id, at(300)).await.unwrap().unwrap();
        assert_eq!(play.start_time, Some(at(300)));

        assert!(
            store
                .record_play_start(Uuid::new_v4(), at(1))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn top_scores_orders_and_filters_by_window() {
        let store = MemoryPlayStore::new();
        store.insert_score(score("a", 300, 100)).await.unwrap();
        store.insert_score(score("b", 100, 5_000)).await.unwrap();
        store.insert_score(score("c", 200, 200)).await.unwrap();

        let all = store.top_scores(2, None).await.unwrap();
        let users: Vec<_> = all.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(users, ["b", "c"]);

        let early = store
            .top_scores(10, Some((at(0), at(1_000))))
            .await
            .unwrap();
        let users: Vec<_> = early.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(users, ["c", "a"]);
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = MemoryPlayStore::new();
        store.set_offline(true);
        let err = store.health_check().await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
        store.set_offline(false);
        store.health_check().await.unwrap();
    }
}
