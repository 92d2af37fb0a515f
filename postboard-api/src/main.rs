use postboard_common::{
    token::TokenKeys,
    util::{NonPositiveDurationError, PositiveDuration},
};
use postboard_db::client::{DbClient, DbError};
use serde::Deserialize;
use server::ServerState;
use std::{
    fmt::{Debug, Formatter},
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use thiserror::Error;
use time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("SECRET_KEY must not be empty")]
    EmptySecretKey,
    #[error("Invalid access token lifetime: {0}")]
    TokenLifetime(#[from] NonPositiveDurationError),
    #[error("Error setting up the database: {0}")]
    Database(#[from] DbError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn default_access_token_expire_minutes() -> u32 {
    30
}

fn default_database_max_connections() -> u32 {
    5
}

#[derive(Clone, Eq, PartialEq, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    secret_key: String,
    #[serde(default = "default_access_token_expire_minutes")]
    access_token_expire_minutes: u32,
    database_url: Option<String>,
    #[serde(default = "default_database_max_connections")]
    database_max_connections: u32,
}

impl Debug for Env {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("server_address", &self.server_address)
            .field("server_port", &self.server_port)
            .field("secret_key", &"[redacted]")
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .field("database_url", &self.database_url.as_ref().map(|_| "[redacted]"))
            .field("database_max_connections", &self.database_max_connections)
            .finish()
    }
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "postboard_api=debug,\
                postboard_common=debug,\
                postboard_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .env file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

fn token_keys(env: &Env) -> Result<TokenKeys, InitError> {
    if env.secret_key.is_empty() {
        return Err(InitError::EmptySecretKey);
    }

    let ttl = PositiveDuration::try_from(Duration::minutes(
        env.access_token_expire_minutes.into(),
    ))?;

    Ok(TokenKeys::new(env.secret_key.as_bytes(), ttl))
}

async fn db_client(env: &Env) -> Result<DbClient, InitError> {
    let Some(database_url) = &env.database_url else {
        warn!("DATABASE_URL is not set, data is kept in memory and lost on shutdown");
        return Ok(DbClient::in_memory());
    };

    Ok(DbClient::connect(database_url, env.database_max_connections).await?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(%err, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;
    debug!(?env, "Loaded environment");

    let token_keys = token_keys(&env)?;
    let db_client = db_client(&env).await?;
    info!(backend = db_client.backend_name(), "Database ready");

    let app = server::app(ServerState {
        db_client: Arc::new(db_client),
        token_keys: Arc::new(token_keys),
    });

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
