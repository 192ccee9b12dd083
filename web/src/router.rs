use crate::{controller::health_check_controller, protect, sse::handler::sse_handler, AppState};
use axum::{middleware::from_fn_with_state, routing::get, Router};

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes(app_state.clone()))
        .merge(subscribe_routes(app_state))
}

fn health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .with_state(app_state)
}

fn subscribe_routes(app_state: AppState) -> Router {
    Router::new()
        // GET /subscribe/:topic/:user_id/:nonce
        .route("/subscribe/:topic/:user_id/:nonce", get(sse_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            protect::subscribe::identity_gate,
        ))
        .with_state(app_state)
}
