use sprintcraft_ai::{BackendCompleter, OpenAiCompatibleBackend, StructuredCompleter};
use sprintcraft_integration::{JiraClient, NagerDateClient};
use sprintcraft_pipeline::{Collaborators, LlmAssignmentAdvisor, Planner};
use sprintcraft_server::{AppState, ServerConfig, StartupError, router};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", StartupError::Config { reason: e.to_string() });
            return std::process::ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=debug", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    tracing::info!(mode = ?config.mode, "Loaded configuration");

    match serve(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server stopped");
            std::process::ExitCode::FAILURE
        }
    }
}

fn collaborators(config: &ServerConfig) -> Result<Collaborators, StartupError> {
    let backend =
        OpenAiCompatibleBackend::new(config.llm.clone()).map_err(|e| StartupError::Client {
            service: "llm",
            reason: e.to_string(),
        })?;
    let completer: Arc<dyn StructuredCompleter> =
        Arc::new(BackendCompleter::new(backend, &config.llm));

    let tracker = JiraClient::new(config.tracker.clone()).map_err(|e| StartupError::Client {
        service: "tracker",
        reason: e.to_string(),
    })?;
    let holidays = NagerDateClient::new(&config.holidays).map_err(|e| StartupError::Client {
        service: "holidays",
        reason: e.to_string(),
    })?;

    Ok(Collaborators {
        advisor: Arc::new(LlmAssignmentAdvisor::new(completer.clone())),
        completer,
        tracker: Arc::new(tracker),
        holidays: Arc::new(holidays),
        country_code: config.holidays.country_code.clone(),
        story_retry: config.tracker.retry_policy(),
    })
}

async fn serve(config: ServerConfig) -> Result<(), StartupError> {
    let collaborators = collaborators(&config)?;
    let planner = Planner::new(&collaborators, &config.planner).map_err(StartupError::Graph)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = router(AppState::new(planner, shutdown_rx));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StartupError::Io {
            reason: format!("failed to bind to {addr}: {e}"),
        })?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| StartupError::Io {
            reason: e.to_string(),
        })
}

/// Waits for SIGINT, SIGTERM or SIGHUP.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (Ok(mut sighup), Ok(mut sigint), Ok(mut sigterm)) = (
            signal(SignalKind::hangup()),
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) else {
            tracing::warn!("failed to install signal handlers, falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        };

        tokio::select! {
            _ = sighup.recv() => tracing::info!("Received SIGHUP, shutting down..."),
            _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Received Ctrl+C, shutting down...");
    }
}
