use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET liveness check, reporting how many subscribers are connected
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        format!(
            "healthy: {} connected",
            app_state.session_registry.count()
        ),
    )
}
