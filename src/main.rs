//! Project Management Client
//!
//! Headless client that restores (or opens) a session against the backend,
//! loads state and follows the notification push channel until interrupted.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pm_client::config::{Config, LogFormat};
use pm_client::models::Credentials;
use pm_client::{SyncClient, SyncReport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting project management client");
    tracing::info!("API base URL: {}", config.api_base_url);
    tracing::info!("Push URL: {}", config.push_url);
    tracing::info!("Storage path: {:?}", config.storage_path);

    let credentials = config.credentials.clone();
    let client = SyncClient::connect(config).await?;

    let report = match client.init().await {
        Some(report) => report,
        None => match credentials {
            Some(creds) => {
                let credentials = Credentials {
                    username: creds.username,
                    password: creds.password,
                };
                client.login(&credentials).await?
            }
            None => {
                tracing::warn!("No stored session and no credentials (PM_USERNAME/PM_PASSWORD)");
                return Ok(());
            }
        },
    };

    log_report(&report);
    {
        let state = client.state();
        let state = state.read().await;
        tracing::info!(
            "{} projects, {} tasks, {} unread notifications",
            state.projects.len(),
            state.tasks.len(),
            state.unread_count()
        );
    }

    tracing::info!("Following push channel; press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;

    client.shutdown().await;
    let state = client.state();
    tracing::info!(
        "Stopped with {} notifications",
        state.read().await.notifications.len()
    );

    Ok(())
}

fn log_report(report: &SyncReport) {
    for failure in &report.failures {
        tracing::warn!(
            "{} unavailable [{}]: {}",
            failure.resource,
            failure.error.error_code(),
            failure.error
        );
    }
}
