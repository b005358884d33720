//! Relay Bot server entrypoint.

use std::sync::Arc;

use reqwest::Client;
use secrecy::ExposeSecret;
use sqlx::{Connection, PgConnection};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_bot::adapters::ai::{OpenAICompletionSource, OpenAIConfig};
use relay_bot::adapters::botframework::{
    BotCredentials, BotTokenProvider, ConnectorClient, ConnectorTransportFactory,
};
use relay_bot::adapters::clock::SystemClock;
use relay_bot::adapters::directory::{
    InMemoryConversationDirectory, PostgresConversationDirectory,
};
use relay_bot::adapters::http::{build_app, BotAppState};
use relay_bot::config::AppConfig;
use relay_bot::ports::ConversationDirectory;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let state = build_state(&config).await?;
    let app = build_app(
        state,
        config.features.enable_notify_endpoint,
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        addr = %addr,
        environment = ?config.server.environment,
        streaming = config.features.enable_streaming,
        "Starting relay bot"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).compact().init();
    }
}

async fn build_state(config: &AppConfig) -> Result<BotAppState, BoxError> {
    let api_key = config
        .ai
        .api_key
        .as_ref()
        .ok_or("AI__API_KEY is required")?;
    let mut ai_config = OpenAIConfig::new(api_key.expose_secret().clone())
        .with_model(config.ai.model.clone())
        .with_timeout(config.ai.timeout());
    if let Some(url) = config.ai.azure_base_url() {
        ai_config = ai_config.with_azure_base_url(url);
    }
    let completions = OpenAICompletionSource::new(ai_config)?;

    let credentials = match (config.bot.app_id(), config.bot.app_password.as_ref()) {
        (Some(app_id), Some(password)) => {
            let credentials = BotCredentials::new(app_id, password.clone());
            Some(match config.bot.tenant_id.as_deref() {
                Some(tenant_id) => credentials.with_tenant_id(tenant_id),
                None => credentials,
            })
        }
        _ => {
            tracing::warn!("No bot credentials configured, connector calls are unauthenticated");
            None
        }
    };
    let tokens = Arc::new(BotTokenProvider::new(credentials, Client::new()));
    let connector = ConnectorClient::new(tokens, config.server.request_timeout())?;

    Ok(BotAppState {
        transports: Arc::new(ConnectorTransportFactory::new(connector)),
        directory: build_directory(config).await?,
        completions: Arc::new(completions),
        clock: Arc::new(SystemClock),
        reply_settings: config.reply_settings(),
        router_config: config.router_config(),
        log_requests: config.features.log_requests,
    })
}

async fn build_directory(config: &AppConfig) -> Result<Arc<dyn ConversationDirectory>, BoxError> {
    let Some(url) = config.database.url() else {
        tracing::warn!("No database configured, conversation addresses are kept in memory");
        return Ok(Arc::new(InMemoryConversationDirectory::new()));
    };

    if config.database.run_migrations {
        let mut conn = PgConnection::connect(url.expose_secret()).await?;
        sqlx::migrate!("./migrations").run(&mut conn).await?;
        conn.close().await?;
        info!("Database migrations applied");
    }

    let directory = PostgresConversationDirectory::new(
        url,
        config.database.table.clone(),
        config.database.connect_timeout(),
    )?;
    info!(table = directory.table(), "Using PostgreSQL conversation directory");
    Ok(Arc::new(directory))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
