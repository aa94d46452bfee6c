//! Assistant Relay - HTTP server binary.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use assistant_relay::app::{assistant_client, build_state, contact_store, router};
use assistant_relay::config::AppConfig;
use assistant_relay::ports::{AssistantApi, ContactStore};

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    setup_logging(&config.server.log_level, config.is_production());

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let addr = match config.server.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid listen address: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let api: Arc<dyn AssistantApi> = match assistant_client(&config.assistant) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create assistant client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let contacts = contact_store(&config.storage);
    info!(
        path = %contacts.path().display(),
        mode = ?config.storage.ledger_mode,
        "Using contact ledger"
    );
    let contacts: Arc<dyn ContactStore> = Arc::new(contacts);

    let shutdown = CancellationToken::new();
    let state = match build_state(&config, api, contacts) {
        Ok(state) => state.with_shutdown(shutdown.clone()),
        Err(e) => {
            error!("Invalid assistant id: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let app = router(&config.server, state);

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting assistant relay on {}", addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, cancelling in-flight runs");
            shutdown.cancel();
        })
        .await;

    match result {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
