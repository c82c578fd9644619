use std::collections::BTreeMap;
use std::path::Path;

use callbridge_config::ConversationServiceConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::AuthError;

/// Path globs granted to every minted token.
pub const DEFAULT_ACL_PATHS: [&str; 10] = [
    "/*/users/**",
    "/*/conversations/**",
    "/*/sessions/**",
    "/*/devices/**",
    "/*/image/**",
    "/*/media/**",
    "/*/applications/**",
    "/*/push/**",
    "/*/knocking/**",
    "/*/legs/**",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessControlList {
    pub paths: BTreeMap<String, Map<String, Value>>,
}

impl Default for AccessControlList {
    fn default() -> Self {
        Self {
            paths: DEFAULT_ACL_PATHS
                .iter()
                .map(|path| (path.to_string(), Map::new()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub application_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub acl: AccessControlList,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Signs RS256 tokens for an application.
#[derive(Clone)]
pub struct TokenMinter {
    application_id: String,
    key: EncodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenMinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenMinter")
            .field("application_id", &self.application_id)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenMinter {
    pub fn from_pem(
        application_id: impl Into<String>,
        pem: &str,
        ttl_seconds: u64,
    ) -> Result<Self, AuthError> {
        // Keys passed through environment variables often carry escaped newlines.
        let pem = pem.replace("\\n", "\n");
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|err| AuthError::InvalidKey(err.to_string()))?;
        let ttl = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or(AuthError::InvalidTtl(ttl_seconds))?;

        Ok(Self {
            application_id: application_id.into(),
            key,
            ttl,
        })
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn claims(&self, sub: Option<&str>) -> AdminClaims {
        let now = Utc::now().timestamp();
        AdminClaims {
            application_id: self.application_id.clone(),
            sub: sub.map(str::to_owned),
            acl: AccessControlList::default(),
            iat: now,
            exp: now.saturating_add(self.ttl.num_seconds()),
            jti: cuid2::create_id(),
        }
    }

    pub fn mint(&self, sub: Option<&str>) -> Result<String, AuthError> {
        let claims = self.claims(sub);
        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|err| AuthError::Signing(err.to_string()))
    }
}

/// Where the admin bearer token for REST calls comes from.
#[derive(Debug, Clone)]
pub enum AdminTokenSource {
    Static(String),
    Minted(TokenMinter),
}

impl AdminTokenSource {
    /// A configured bearer token wins, then an inline PEM, then a PEM file.
    pub fn from_config(config: &ConversationServiceConfig) -> Result<Self, AuthError> {
        if let Some(token) = config.bearer_token.as_deref().filter(|t| !t.is_empty()) {
            debug!("using static admin bearer token");
            return Ok(Self::Static(token.to_string()));
        }

        let application_id = config
            .application_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::NotConfigured("conversation_service.application_id"))?;

        let pem = match (&config.private_key, &config.private_key_path) {
            (Some(pem), _) if !pem.is_empty() => pem.clone(),
            (_, Some(path)) => std::fs::read_to_string(Path::new(path)).map_err(|source| {
                AuthError::KeyFile {
                    path: path.clone(),
                    source,
                }
            })?,
            _ => return Err(AuthError::NotConfigured("conversation_service.private_key")),
        };

        let minter = TokenMinter::from_pem(application_id, &pem, config.token_ttl_seconds)?;
        debug!(application_id, "minting admin tokens from private key");
        Ok(Self::Minted(minter))
    }

    pub fn bearer(&self) -> Result<String, AuthError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::Minted(minter) => minter.mint(None),
        }
    }

    /// Mints a client token for `user`. A static bearer cannot be scoped to a
    /// user, so it requires a private key.
    pub fn user_token(&self, user: &str) -> Result<String, AuthError> {
        match self {
            Self::Static(_) => Err(AuthError::NotConfigured("conversation_service.private_key")),
            Self::Minted(minter) => minter.mint(Some(user)),
        }
    }
}
