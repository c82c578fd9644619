pub mod health;
pub mod tokens;
pub mod webhooks;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::GatewayState;

pub fn create_rest_routes(token_endpoints: bool) -> Router<Arc<GatewayState>> {
    let router = Router::new()
        .route("/ping", get(health::ping))
        .route("/health", get(health::health_check))
        .route("/webhooks/rtc-event", post(webhooks::rtc_event))
        .route("/webhooks/voice-answer", post(webhooks::voice_answer))
        .route("/webhooks/voice-event", post(webhooks::voice_event))
        .route("/webhooks/message-inbound", post(webhooks::message_inbound));

    if token_endpoints {
        router
            .route("/admin", get(tokens::admin_token))
            .route("/user/:name", get(tokens::user_token))
    } else {
        router
    }
}
