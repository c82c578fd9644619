use anyhow::{Context, Result};
use callbridge_auth::AdminTokenSource;
use callbridge_config::AppConfig;
use callbridge_conversations::ConversationClient;
use callbridge_gateway::GatewayState;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    /// Installs the global subscriber; `RUST_LOG` overrides the `info` default.
    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct Services {
    pub tokens: AdminTokenSource,
    pub conversations: ConversationClient,
    pub gateway: GatewayState,
}

impl Services {
    pub fn initialise(config: &AppConfig) -> Result<Self> {
        let tokens = AdminTokenSource::from_config(&config.conversation_service)
            .context("failed to configure admin token source")?;

        let conversations =
            ConversationClient::from_config(&config.conversation_service, tokens.clone())
                .context("failed to build conversation client")?;

        let gateway =
            GatewayState::with_conversation_handlers(conversations.clone(), config.bot.name.clone())
                .with_token_endpoints(config.http.token_endpoints);

        info!(
            endpoint = %conversations.endpoint(),
            bot = %config.bot.name,
            token_endpoints = config.http.token_endpoints,
            "services ready"
        );

        Ok(Self {
            tokens,
            conversations,
            gateway,
        })
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(?error, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(?error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
