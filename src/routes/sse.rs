use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    services::{play_service, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/plays/{id}/events",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Identifier of the play")),
    responses((status = 200, description = "Snapshot stream", content_type = "text/event-stream", body = String))
)]
/// Stream every snapshot of a play, starting with the current one.
pub async fn play_events(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let runtime = play_service::subscribe(&state, id)?;
    info!(play_id = %id, "new play SSE connection");
    Ok(sse_service::to_sse_stream(&runtime))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/plays/{id}/events", get(play_events))
}
