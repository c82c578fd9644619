use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayResult};
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenBody {
    pub token: String,
}

#[utoipa::path(
    get,
    path = "/admin",
    tag = "Tokens",
    responses(
        (status = 200, description = "Admin bearer token", body = TokenBody),
        (status = 500, description = "No token could be produced", body = ErrorResponse)
    )
)]
pub async fn admin_token(State(state): State<Arc<GatewayState>>) -> GatewayResult<Json<TokenBody>> {
    let token = state.conversations.token_source().bearer()?;
    Ok(Json(TokenBody { token }))
}

#[utoipa::path(
    get,
    path = "/user/{name}",
    tag = "Tokens",
    params(("name" = String, Path, description = "User the token is minted for")),
    responses(
        (status = 200, description = "Client token for the user", body = TokenBody),
        (status = 500, description = "No private key to mint with", body = ErrorResponse)
    )
)]
pub async fn user_token(
    State(state): State<Arc<GatewayState>>,
    Path(name): Path<String>,
) -> GatewayResult<Json<TokenBody>> {
    let token = state.conversations.token_source().user_token(&name)?;
    info!(user = %name, "user token issued");
    Ok(Json(TokenBody { token }))
}
