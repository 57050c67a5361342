use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod leaderboard;
pub mod payouts;
pub mod plays;
pub mod sse;
pub mod users;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(plays::router())
        .merge(sse::router())
        .merge(users::router())
        .merge(leaderboard::router())
        .merge(payouts::router());

    api_router.merge(docs::router()).with_state(state)
}
