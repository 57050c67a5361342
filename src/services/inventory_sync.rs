//! Best-effort writes to the play store: inventory deltas in the background and
//! power-up usage counters in line.
//!
//! Failures are logged at `warn` and never reach the caller.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::{models::InventoryDelta, play_store::PlayStore},
    state::inventory::PowerUpKind,
};

/// Delta that changes only the counter of `kind`.
pub fn delta_for(kind: PowerUpKind, count: i64) -> InventoryDelta {
    match kind {
        PowerUpKind::Peek => InventoryDelta {
            peek: count,
            auto_match: 0,
        },
        PowerUpKind::AutoMatch => InventoryDelta {
            peek: 0,
            auto_match: count,
        },
    }
}

/// Persist a change of `count` charges of `kind` for `user_id` in the background.
pub fn spawn_inventory_delta(
    store: Arc<dyn PlayStore>,
    user_id: String,
    kind: PowerUpKind,
    count: i64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match store
            .adjust_inventory(user_id.clone(), delta_for(kind, count))
            .await
        {
            Ok(user) => debug!(
                %user_id,
                ?kind,
                count,
                peek = user.peek_count,
                auto_match = user.auto_match_count,
                "inventory synced"
            ),
            Err(err) => warn!(%user_id, ?kind, count, error = %err, "inventory sync failed"),
        }
    })
}

/// Count a power-up use on the play record.
///
/// Awaited by the caller so a score submitted right after sees the use.
pub async fn record_usage(
    store: &dyn PlayStore,
    play_id: Uuid,
    kind: PowerUpKind,
    from_inventory: bool,
) {
    match store.record_powerup(play_id, kind, from_inventory).await {
        Ok(Some(_)) => {}
        Ok(None) => warn!(%play_id, ?kind, "power-up used on an unknown play"),
        Err(err) => warn!(%play_id, ?kind, error = %err, "failed to record power-up usage"),
    }
}
