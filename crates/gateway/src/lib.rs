//! HTTP surface for the callbridge webhooks.
//!
//! - `POST /webhooks/rtc-event`: RTC events, validated and dispatched to the
//!   conversation handlers. The body is echoed back on success.
//! - `POST /webhooks/voice-answer` and `POST /webhooks/voice-event`: NCCO
//!   builders for the voice API.
//! - `POST /webhooks/message-inbound`: routes sms, viber and messenger
//!   messages into a conversation.
//! - `GET /ping` and `GET /health`.
//! - `GET /admin` and `GET /user/{name}` when token endpoints are enabled.
//!
//! ```no_run
//! # async fn run(state: callbridge_gateway::GatewayState) -> std::io::Result<()> {
//! let app = callbridge_gateway::create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:7070").await?;
//! axum::serve(listener, app).await
//! # }
//! ```

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;

pub use error::{ErrorResponse, GatewayError, GatewayResult};
pub use state::GatewayState;

use std::sync::Arc;

use axum::{http::Method, middleware as axum_middleware, Router};
use tower_http::cors::{Any, CorsLayer};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Create the webhook router.
pub fn create_router(state: GatewayState) -> Router {
    let token_endpoints = state.token_endpoints;
    let arc_state = Arc::new(state);
    #[allow(unused_mut)]
    let mut router = Router::new()
        .merge(rest::create_rest_routes(token_endpoints).with_state(arc_state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        )
        .layer(middleware::create_trace_middleware())
        .layer(axum_middleware::from_fn(middleware::logging_middleware));

    #[cfg(debug_assertions)]
    {
        #[derive(OpenApi)]
        #[openapi(
            paths(
                rest::health::ping,
                rest::health::health_check,
                rest::webhooks::rtc_event,
                rest::webhooks::voice_answer,
                rest::webhooks::voice_event,
                rest::webhooks::message_inbound,
                rest::tokens::admin_token,
                rest::tokens::user_token,
            ),
            components(schemas(
                rest::health::PingResponse,
                rest::health::HealthResponse,
                rest::tokens::TokenBody,
                error::ErrorResponse,
            )),
            tags(
                (name = "Health", description = "Liveness and dependency checks"),
                (name = "Webhooks", description = "Conversation and voice webhooks"),
                (name = "Tokens", description = "Admin and user tokens"),
            )
        )]
        struct ApiDoc;

        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
}
