use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use callbridge_events::{inbound_message_ncco, voice_event_ncco, DispatchOutcome, VoiceAnswer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ErrorResponse, GatewayResult};
use crate::state::GatewayState;

/// Webhook bodies are parsed here rather than through the `Json` extractor so
/// malformed payloads and missing content types get an [`ErrorResponse`].
fn parse_body(body: &Bytes) -> GatewayResult<Value> {
    Ok(serde_json::from_slice(body)?)
}

#[utoipa::path(
    post,
    path = "/webhooks/rtc-event",
    tag = "Webhooks",
    responses(
        (status = 200, description = "Event accepted, the request body is echoed back"),
        (status = 400, description = "Body is not valid JSON", body = ErrorResponse),
        (status = 500, description = "Payload does not match the schema of its type", body = ErrorResponse)
    )
)]
pub async fn rtc_event(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> GatewayResult<Json<Value>> {
    let payload = parse_body(&body)?;
    match state.dispatcher.dispatch(payload.clone()).await? {
        DispatchOutcome::Handled(kind) => debug!(event_type = %kind, "rtc event handled"),
        DispatchOutcome::Ignored(event_type) => debug!(event_type, "rtc event ignored"),
    }
    Ok(Json(payload))
}

#[utoipa::path(
    post,
    path = "/webhooks/voice-answer",
    tag = "Webhooks",
    responses(
        (status = 200, description = "NCCO for the answered call"),
        (status = 400, description = "Body is not valid JSON, or neither a server call nor an inbound call", body = ErrorResponse)
    )
)]
pub async fn voice_answer(body: Bytes) -> GatewayResult<Response> {
    let payload = parse_body(&body)?;
    let answer = VoiceAnswer::from_value(&payload)?;
    Ok(Json(answer.ncco()).into_response())
}

#[utoipa::path(
    post,
    path = "/webhooks/voice-event",
    tag = "Webhooks",
    responses(
        (status = 200, description = "NCCO joining the conversation named by the entered digits"),
        (status = 204, description = "Event acknowledged, no call control"),
        (status = 400, description = "Body is not valid JSON", body = ErrorResponse)
    )
)]
pub async fn voice_event(body: Bytes) -> GatewayResult<Response> {
    let payload = parse_body(&body)?;
    Ok(match voice_event_ncco(&payload) {
        Some(ncco) => Json(ncco).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

#[utoipa::path(
    post,
    path = "/webhooks/message-inbound",
    tag = "Webhooks",
    responses(
        (status = 200, description = "Message NCCO for sms, viber_service and messenger; the text `invalid channel` otherwise")
    )
)]
pub async fn message_inbound(body: Bytes) -> Response {
    let ncco = match parse_body(&body) {
        Ok(payload) => inbound_message_ncco(&payload),
        Err(error) => {
            warn!(%error, "unreadable inbound message");
            None
        }
    };

    match ncco {
        Some(ncco) => Json(ncco).into_response(),
        None => (StatusCode::OK, "invalid channel").into_response(),
    }
}
