use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "callbridge.toml",
    "config/callbridge.toml",
    "crates/config/callbridge.toml",
    "../callbridge.toml",
    "../config/callbridge.toml",
    "../crates/config/callbridge.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub store: StoreConfig,
    pub conversation_service: ConversationServiceConfig,
    pub auth_api: AuthApiConfig,
    pub voice: VoiceConfig,
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
    /// Mounts `GET /admin` and `GET /user/{name}`, which hand out tokens.
    #[serde(default)]
    pub token_endpoints: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
            token_endpoints: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://callbridge.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Connection settings for the conversation service REST API.
///
/// Requests are authenticated with an admin bearer token: a configured
/// `bearer_token` is used verbatim, otherwise a JWT is minted from the
/// application's private key (inline `private_key` first, then
/// `private_key_path`).
///
/// ```
/// use callbridge_config::ConversationServiceConfig;
///
/// let service = ConversationServiceConfig::default();
/// assert_eq!(service.endpoint, "https://api-us-3.vonage.com/v1");
/// assert_eq!(service.token_ttl_seconds, 3600);
/// assert!(service.bearer_token.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationServiceConfig {
    #[serde(default = "ConversationServiceConfig::default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub private_key_path: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default = "ConversationServiceConfig::default_token_ttl")]
    pub token_ttl_seconds: u64,
    #[serde(default = "ConversationServiceConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ConversationServiceConfig {
    fn default_endpoint() -> String {
        "https://api-us-3.vonage.com/v1".to_string()
    }

    const fn default_token_ttl() -> u64 {
        3600
    }

    const fn default_request_timeout() -> u64 {
        30
    }
}

impl Default for ConversationServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            application_id: None,
            private_key: None,
            private_key_path: None,
            bearer_token: None,
            token_ttl_seconds: Self::default_token_ttl(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthApiConfig {
    #[serde(default)]
    pub login_url: Option<String>,
    #[serde(default)]
    pub refresh_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "AuthApiConfig::default_availability")]
    pub availability: String,
}

impl AuthApiConfig {
    fn default_availability() -> String {
        "VOICE".to_string()
    }
}

impl Default for AuthApiConfig {
    fn default() -> Self {
        Self {
            login_url: None,
            refresh_url: None,
            api_key: None,
            availability: Self::default_availability(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// How long a disconnected call stays visible before the slot is cleared.
    #[serde(default = "VoiceConfig::default_disconnect_grace")]
    pub disconnect_grace_millis: u64,
    #[serde(default = "VoiceConfig::default_callee")]
    pub default_callee: String,
}

impl VoiceConfig {
    const fn default_disconnect_grace() -> u64 {
        1500
    }

    fn default_callee() -> String {
        "xxxxxx".to_string()
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            disconnect_grace_millis: Self::default_disconnect_grace(),
            default_callee: Self::default_callee(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "bot:vonage".to_string(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use callbridge_config::load;
///
/// std::env::remove_var("CALLBRIDGE_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("http.token_endpoints", defaults.http.token_endpoints)?
        .set_default("store.url", defaults.store.url.clone())?
        .set_default("store.max_connections", i64::from(defaults.store.max_connections))?
        .set_default(
            "conversation_service.endpoint",
            defaults.conversation_service.endpoint.clone(),
        )?
        .set_default(
            "conversation_service.token_ttl_seconds",
            i64::try_from(defaults.conversation_service.token_ttl_seconds).unwrap_or(i64::MAX),
        )?
        .set_default(
            "conversation_service.request_timeout_seconds",
            i64::try_from(defaults.conversation_service.request_timeout_seconds)
                .unwrap_or(i64::MAX),
        )?
        .set_default("auth_api.availability", defaults.auth_api.availability.clone())?
        .set_default(
            "voice.disconnect_grace_millis",
            i64::try_from(defaults.voice.disconnect_grace_millis).unwrap_or(i64::MAX),
        )?
        .set_default("voice.default_callee", defaults.voice.default_callee.clone())?
        .set_default("bot.name", defaults.bot.name.clone())?;

    let environment_overrides = config::Environment::with_prefix("CALLBRIDGE").separator("__");

    let mut builder = builder;
    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("CALLBRIDGE_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via CALLBRIDGE_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(
        http = ?config.http,
        endpoint = %config.conversation_service.endpoint,
        "loaded configuration"
    );
    Ok(config)
}
