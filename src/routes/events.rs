use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::{
    dto::event_dto::CertificateEventEnvelope, error::Result,
    services::event_dispatcher::CertificateSignal, AppState,
};

/// Hands one host event to the matching dispatcher handler. The delivery
/// outcome is reported back; a failed delivery is still a 202.
pub async fn receive_event(
    State(state): State<AppState>,
    Path(signal): Path<String>,
    Json(envelope): Json<CertificateEventEnvelope>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let signal: CertificateSignal = signal.parse()?;

    let delivery = match signal {
        CertificateSignal::Created => state.dispatcher.on_certificate_created(&envelope).await,
        CertificateSignal::Changed => state.dispatcher.on_certificate_changed(&envelope).await,
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "signal": signal, "delivery": delivery })),
    ))
}
