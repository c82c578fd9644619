use anyhow::{bail, Context};
use callbridge_auth::AdminTokenSource;
use callbridge_config::{load as load_config, AppConfig};
use callbridge_gateway::create_router;
use callbridge_runtime::{shutdown_signal, telemetry, Services};
use callbridge_store::{prepare_store, PreferenceKey, PreferenceStore, SqlitePreferenceStore};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "callbridge")]
#[command(about = "Conversation webhook service (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Print an admin JWT for the conversation service
    MintToken {
        /// Subject claim, for tokens acting on behalf of a user
        #[arg(long)]
        sub: Option<String>,
    },
    /// Show the values held by the preference store
    DumpPreferences,
    /// Remove every value from the preference store
    ClearPreferences,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::MintToken { sub } => mint_token(sub.as_deref()),
        Commands::DumpPreferences => dump_preferences().await,
        Commands::ClearPreferences => clear_preferences().await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting callbridge");

    let config = load_config().context("failed to load configuration")?;

    let services = Services::initialise(&config).context("failed to initialise services")?;

    let app = create_router(services.gateway.clone());

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    info!("callbridge shut down");
    Ok(())
}

fn mint_token(sub: Option<&str>) -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;

    let source = AdminTokenSource::from_config(&config.conversation_service)
        .context("failed to configure admin token source")?;

    let token = match source {
        AdminTokenSource::Minted(minter) => minter.mint(sub).context("failed to sign token")?,
        AdminTokenSource::Static(_) => {
            bail!("conversation_service.bearer_token is set; unset it to mint tokens")
        }
    };

    println!("{token}");
    Ok(())
}

async fn open_preferences(config: &AppConfig) -> anyhow::Result<SqlitePreferenceStore> {
    let pool = prepare_store(&config.store)
        .await
        .context("failed to prepare preference store")?;
    Ok(SqlitePreferenceStore::new(pool))
}

fn masked(key: PreferenceKey, value: &str) -> String {
    match key {
        PreferenceKey::AuthToken | PreferenceKey::RefreshToken => {
            let prefix: String = value.chars().take(8).collect();
            format!("{prefix}…")
        }
        _ => value.to_string(),
    }
}

async fn dump_preferences() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let store = open_preferences(&config).await?;

    println!("=== PREFERENCES ({}) ===", config.store.url);
    println!("{:<22} {}", "Key", "Value");
    println!("{}", "-".repeat(60));

    for key in PreferenceKey::ALL {
        let value = store
            .get(key)
            .await
            .with_context(|| format!("failed to read {key}"))?;
        let shown = value
            .as_deref()
            .map(|value| masked(key, value))
            .unwrap_or_else(|| "NULL".to_string());
        println!("{:<22} {}", key.as_str(), shown);
    }
    Ok(())
}

async fn clear_preferences() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let store = open_preferences(&config).await?;

    store
        .clear()
        .await
        .context("failed to clear preference store")?;
    println!("Preference store cleared ({})", config.store.url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::parse_from(["callbridge"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn mint_token_accepts_a_subject() {
        let cli = Cli::parse_from(["callbridge", "mint-token", "--sub", "alice"]);
        match cli.command {
            Some(Commands::MintToken { sub }) => assert_eq!(sub.as_deref(), Some("alice")),
            _ => panic!("expected mint-token"),
        }
    }

    #[test]
    fn session_tokens_are_masked() {
        assert_eq!(masked(PreferenceKey::AuthToken, "abcdefghijkl"), "abcdefgh…");
        assert_eq!(masked(PreferenceKey::DeviceId, "DEV-1"), "DEV-1");
    }
}
