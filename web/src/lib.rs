use ::sse::{Manager, SessionRegistry};
use entity_api::user::CredentialStore;
use log::*;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;

mod controller;
mod error;
mod params;
mod protect;
pub mod router;
mod sse;

pub use error::{Error, Result};

/// Shared state for every request handler.
/// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub credential_store: Arc<dyn CredentialStore>,
    pub session_registry: Arc<SessionRegistry>,
    pub sse_manager: Arc<Manager>,
}

impl AppState {
    pub fn new(
        credential_store: Arc<dyn CredentialStore>,
        session_registry: &Arc<SessionRegistry>,
        sse_manager: &Arc<Manager>,
    ) -> Self {
        Self {
            credential_store,
            session_registry: Arc::clone(session_registry),
            sse_manager: Arc::clone(sse_manager),
        }
    }
}

/// Serves the subscribe and health routes until the listener fails.
pub async fn init_server(config: &Config, app_state: AppState) -> std::io::Result<()> {
    let host = config.interface.as_deref().unwrap_or("127.0.0.1");
    let listener = TcpListener::bind((host, config.port)).await?;

    info!(
        "Server starting... listening for connections on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, router::define_routes(app_state)).await
}
