use crate::error::Error;
use crate::params::subscribe::{parse_identity, SubscribePath};
use crate::AppState;
use async_stream::stream;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use log::*;
use sse::{Identity, SessionRegistry, SessionTicket};
use std::sync::Arc;

/// Admits a subscriber only if its path identity is known to the credential store,
/// and keeps it in the session registry for exactly as long as the downstream
/// response is streaming.
///
/// The authenticated `Identity` is inserted into the request extensions.
pub(crate) async fn identity_gate(
    State(app_state): State<AppState>,
    path: SubscribePath,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = match parse_identity(path) {
        Ok(identity) => identity,
        Err(e) => {
            error!("error parsing user info from request: {e}");
            return e.into_response();
        }
    };

    match app_state
        .credential_store
        .exists(&identity.user_id, &identity.nonce)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            error!("service called with nonexistent user: {}", identity.user_id);
            return Error::UnknownIdentity(identity.user_id).into_response();
        }
        Err(e) => {
            error!("error looking up user in credential store: {e}");
            return Error::from(e).into_response();
        }
    }

    debug!(
        "CONNECT: userID: {}, topic: {}",
        identity.user_id, identity.topic
    );
    let guard = SessionGuard::acquire(Arc::clone(&app_state.session_registry), identity.clone());

    request.extensions_mut().insert(identity);
    let response = next.run(request).await;

    hold_until_finished(response, guard)
}

/// Removes its session from the registry when dropped.
pub(crate) struct SessionGuard {
    registry: Arc<SessionRegistry>,
    ticket: SessionTicket,
}

impl SessionGuard {
    pub(crate) fn acquire(registry: Arc<SessionRegistry>, identity: Identity) -> Self {
        let ticket = registry.insert(identity);
        Self { registry, ticket }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let identity = self.ticket.identity();
        debug!(
            "DISCONNECT: userID: {}, topic: {}",
            identity.user_id, identity.topic
        );
        if !self.registry.release(&self.ticket) {
            debug!(
                "Session for user {} was already replaced by a newer connection",
                identity.user_id
            );
        }
    }
}

/// Ties the guard to the response body so it drops when the stream ends,
/// errors, or is abandoned by the client.
fn hold_until_finished(response: Response, guard: SessionGuard) -> Response {
    let (parts, body) = response.into_parts();
    let mut data = body.into_data_stream();

    let guarded = stream! {
        let _guard = guard;
        while let Some(chunk) = data.next().await {
            yield chunk;
        }
    };

    Response::from_parts(parts, Body::from_stream(guarded))
}
