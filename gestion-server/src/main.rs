//! gestion-server entry point
//!
//! `gestion-server` serves the API; `gestion-server issue-token <user>`
//! prints a bearer token signed with the configured secret.

use gestion_server::auth::TOKEN_EXPIRY_HOURS;
use gestion_server::config::BoxError;
use gestion_server::{AppState, Config, create_router, create_token};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gestion_server=info,afip_client=info,tower_http=info".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [command, subject] = args.as_slice()
        && command == "issue-token"
    {
        let token = create_token(
            subject,
            &config.jwt_secret,
            chrono::Duration::hours(TOKEN_EXPIRY_HOURS),
        )?;
        println!("{token}");
        return Ok(());
    }

    tracing::info!("Starting gestion-server (env: {})", config.environment);

    let state = AppState::from_config(&config)?;
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("gestion-server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("gestion-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
