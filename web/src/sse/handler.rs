use crate::AppState;
use async_stream::stream;
use axum::extract::{Extension, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use log::*;
use sse::connection::ConnectionId;
use sse::{Identity, Manager};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;

/// SSE handler holding one long-lived stream open on the subscriber's namespace.
/// Must run behind the identity gate, which supplies the `Identity`.
pub(crate) async fn sse_handler(
    Extension(identity): Extension<Identity>,
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let namespace = identity.namespace();
    debug!("Establishing SSE connection on {namespace}");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let registration = StreamRegistration {
        connection_id: app_state.sse_manager.register_connection(namespace, tx),
        manager: Arc::clone(&app_state.sse_manager),
    };

    let stream = stream! {
        let _registration = registration;
        while let Some(event) = rx.recv().await {
            yield event;
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Unregisters the stream from the manager when the client goes away.
struct StreamRegistration {
    connection_id: ConnectionId,
    manager: Arc<Manager>,
}

impl Drop for StreamRegistration {
    fn drop(&mut self) {
        self.manager.unregister_connection(&self.connection_id);
    }
}
