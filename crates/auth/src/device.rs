use async_trait::async_trait;
use callbridge_config::AuthApiConfig;
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::AuthError;

/// Tokens issued by the device auth API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub vonage_token: String,
    pub refresh_token: String,
}

/// Exchanges device codes and refresh tokens for SDK tokens.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn login(&self, code: &str) -> Result<TokenResponse, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    code: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    availability: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    availability: &'a str,
}

#[derive(Debug, Clone)]
pub struct DeviceAuthClient {
    http: reqwest::Client,
    login_url: String,
    refresh_url: String,
    api_key: Option<String>,
    availability: String,
}

impl DeviceAuthClient {
    pub fn new(
        login_url: impl Into<String>,
        refresh_url: impl Into<String>,
        api_key: Option<String>,
        availability: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            login_url: login_url.into(),
            refresh_url: refresh_url.into(),
            api_key,
            availability: availability.into(),
        }
    }

    pub fn from_config(config: &AuthApiConfig) -> Result<Self, AuthError> {
        let login_url = config
            .login_url
            .clone()
            .ok_or(AuthError::NotConfigured("auth_api.login_url"))?;
        let refresh_url = config
            .refresh_url
            .clone()
            .ok_or(AuthError::NotConfigured("auth_api.refresh_url"))?;
        Ok(Self::new(
            login_url,
            refresh_url,
            config.api_key.clone(),
            config.availability.clone(),
        ))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        forbidden: AuthError,
    ) -> Result<TokenResponse, AuthError> {
        let mut request = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            warn!(url, "auth api rejected credentials");
            return Err(forbidden);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<TokenResponse>().await?)
    }
}

#[async_trait]
impl CredentialExchange for DeviceAuthClient {
    async fn login(&self, code: &str) -> Result<TokenResponse, AuthError> {
        debug!("exchanging device login code");
        let body = LoginRequest {
            code,
            kind: "login",
            availability: &self.availability,
        };
        self.post(&self.login_url, &body, AuthError::InvalidCode).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        debug!("refreshing device token");
        let body = RefreshRequest {
            refresh_token,
            kind: "refresh",
            availability: &self.availability,
        };
        self.post(&self.refresh_url, &body, AuthError::InvalidRefreshToken)
            .await
    }
}
