pub mod certificates;
pub mod events;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{middleware::auth::require_webhook_secret, AppState};

pub fn router(state: AppState) -> Router {
    let host_api = Router::new()
        .route(
            "/api/certificates/issued",
            post(certificates::certificate_issued),
        )
        .route("/api/events/:signal", post(events::receive_event))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_webhook_secret,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(host_api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
