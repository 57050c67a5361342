use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio_stream::{StreamExt, wrappers::WatchStream};
use tracing::warn;

use crate::{
    dto::{play::PlaySnapshot, sse::ServerEvent},
    state::runtime::SessionRuntime,
};

/// Name of the event carrying a [`PlaySnapshot`].
pub const SNAPSHOT_EVENT: &str = "snapshot";

/// Turn the snapshot channel of a session into an SSE response.
///
/// The current snapshot is sent first, then every published change. Events
/// carry the play id the session is bound to when they are sent, so a reset
/// shows up as a new id. The stream ends when the play is dropped.
pub fn to_sse_stream(
    runtime: &Arc<SessionRuntime>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    let handle = Arc::downgrade(runtime);
    let user_id = runtime.user_id().to_owned();
    let stream = WatchStream::new(runtime.subscribe()).filter_map(move |snapshot| {
        let play_id = handle.upgrade()?.play_id();
        let payload = PlaySnapshot::new(play_id, &user_id, &snapshot);
        match ServerEvent::json(Some(SNAPSHOT_EVENT.to_string()), &payload) {
            Ok(event) => Some(Ok(to_event(event))),
            Err(err) => {
                warn!(%play_id, error = %err, "failed to serialise snapshot");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}
