use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::{error::Error, AppState};

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Guards the inbound host routes when a shared secret is configured.
pub async fn require_webhook_secret(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.inbound_secret.as_deref() else {
        return next.run(req).await;
    };

    let Some(provided) = req.headers().get(WEBHOOK_SECRET_HEADER) else {
        return unauthorized("missing_webhook_secret");
    };
    let Ok(provided) = provided.to_str() else {
        return unauthorized("invalid_secret_header");
    };

    if ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into() {
        next.run(req).await
    } else {
        unauthorized("invalid_webhook_secret")
    }
}

fn unauthorized(reason: &str) -> Response {
    Error::Unauthorized(reason.to_string()).into_response()
}
