/// BloodBridge Server - blood-donation coordination backend
use anyhow::Context;
use bloodbridge_checkout::{CheckoutConfig, StripeCheckoutClient};
use bloodbridge_core::{fields, str_field, Collection, DocumentStore, Filter, FindOptions, Role};
use bloodbridge_server::{
    config::ServerConfig,
    create_router,
    services::{verifier_from_settings, SharedSecretVerifier},
    state::{AppState, CheckoutOptions},
};
use bloodbridge_storage::SqliteDocumentStore;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::{net::SocketAddr, path::Path, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bloodbridge-server")]
#[command(about = "BloodBridge blood-donation coordination server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Set a user's role directly in the store (e.g. the first admin)
    SetRole {
        /// User email
        #[arg(short, long)]
        email: String,
        /// donor, volunteer or admin
        #[arg(short, long)]
        role: Role,
    },
    /// List all users
    ListUsers,
    /// Mint a development bearer token (shared-secret mode only)
    IssueToken {
        /// User email
        #[arg(short, long)]
        email: String,
        /// Validity in hours
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bloodbridge_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            serve().await?;
        }
        Commands::SetRole { email, role } => {
            set_role(&email, role).await?;
        }
        Commands::ListUsers => {
            list_users().await?;
        }
        Commands::IssueToken { email, hours } => {
            issue_token(&email, hours)?;
        }
    }

    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;
    config.validate()?;

    tracing::info!("Starting BloodBridge server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    // Initialize database
    let store = open_store(&config).await?;
    tracing::info!("Database connected");

    // Identity provider
    let identity = verifier_from_settings(&config.identity)?;

    // Payment processor
    let checkout = StripeCheckoutClient::new(
        CheckoutConfig::new(config.payments.stripe_secret_key.clone())
            .with_api_base(config.payments.api_base.clone()),
    )?;
    tracing::info!(api_base = %checkout.base_url(), "Checkout client initialized");

    // Build application state
    let app_state = AppState::new(
        Arc::new(store),
        identity,
        Arc::new(checkout),
        CheckoutOptions::from_settings(&config.payments),
    );

    // Build router
    let app = create_router(app_state);

    // Create server address
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the store, creating the database directory if needed
async fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteDocumentStore> {
    let url = &config.storage.database_url;
    if let Some(path) = url.strip_prefix("sqlite://").map(Path::new) {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating database directory {}", dir.display()))?;
        }
    }

    Ok(SqliteDocumentStore::open(url).await?)
}

async fn set_role(email: &str, role: Role) -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    let store = open_store(&config).await?;

    let mut patch = serde_json::Map::new();
    patch.insert(fields::ROLE.to_string(), Value::from(role.as_str()));

    let result = store
        .update_one(Collection::Users, &Filter::new().eq(fields::EMAIL, email), patch)
        .await?;

    if result.matched_count == 0 {
        anyhow::bail!("no user with email {}", email);
    }

    println!("{} is now {}", email, role);
    Ok(())
}

async fn list_users() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    let store = open_store(&config).await?;

    let users = store
        .find_many(Collection::Users, &Filter::new(), FindOptions::all())
        .await?;

    println!("Users:");
    for user in users {
        println!(
            "  {} - {} ({})",
            str_field(&user, fields::EMAIL).unwrap_or("<no email>"),
            str_field(&user, fields::ROLE).unwrap_or("donor"),
            str_field(&user, fields::STATUS).unwrap_or("active"),
        );
    }

    Ok(())
}

fn issue_token(email: &str, hours: i64) -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    let secret = config
        .identity
        .shared_secret()
        .context("issue-token requires BLOODBRIDGE_IDENTITY__SHARED_SECRET")?;

    let ttl = token_lifetime(hours)?;
    let token = SharedSecretVerifier::new(secret).issue(email, ttl)?;
    println!("{}", token);
    Ok(())
}

fn token_lifetime(hours: i64) -> anyhow::Result<chrono::Duration> {
    chrono::Duration::try_hours(hours)
        .filter(|ttl| *ttl > chrono::Duration::zero())
        .with_context(|| format!("--hours must be a positive number of hours, got {}", hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lifetime_bounds() {
        assert_eq!(token_lifetime(24).unwrap(), chrono::Duration::hours(24));
        assert!(token_lifetime(0).is_err());
        assert!(token_lifetime(-1).is_err());
        assert!(token_lifetime(i64::MAX).is_err());
    }
}
