use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct PingResponse {
    pub status: String,
}

/// Per-check results keyed by check name (`token`, `conversation_service`).
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct HealthResponse {
    pub healthy: BTreeMap<String, bool>,
    pub error_message: BTreeMap<String, String>,
}

impl HealthResponse {
    fn record<E: std::fmt::Display>(&mut self, check: &str, result: Result<(), E>) {
        match result {
            Ok(()) => {
                self.healthy.insert(check.to_string(), true);
            }
            Err(err) => {
                warn!(check, error = %err, "health check failed");
                self.healthy.insert(check.to_string(), false);
                self.error_message.insert(check.to_string(), err.to_string());
            }
        }
    }
}

#[utoipa::path(
    get,
    path = "/ping",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = PingResponse)
    )
)]
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Result of each dependency check", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<GatewayState>>) -> Json<HealthResponse> {
    let token = state.conversations.token_source().bearer().map(|_| ());
    let service = state.conversations.check_reachable().await;

    let mut response = HealthResponse::default();
    response.record("token", token);
    response.record("conversation_service", service);
    Json(response)
}
