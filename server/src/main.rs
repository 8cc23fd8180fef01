//! Clinic management HTTP backend.
//!
//! Wires configuration, MongoDB, SMTP, and JWT keys into one shared
//! state and serves the REST API.

mod auth;
mod config;
mod db;
mod error;
mod mailer;
mod models;
mod routes;
mod schedule;
mod state;

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::mailer::Mailer;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let db = db::Db::connect(&config.mongo_uri, &config.mongo_db).await?;
    let jwt = auth::JwtKeys::new(&config.jwt_secret, config.token_ttl_hours);
    let mailer = Mailer::new(&config.smtp, &config.public_base_url);
    let state = AppState { db, jwt, mailer };

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
