use std::{process, sync::Arc, time::Duration};

use postdeck::{
    application::{
        admin::AdminService,
        error::AppError,
        pagination::{PaginationOptions, PaginationStorage},
        routes::RouteAdapter,
    },
    cache::{ApiClient, CacheConfig},
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        memory::{InMemoryBackend, SeedData},
        storage::{JsonFileStorage, MemoryStorage},
        telemetry,
    },
};
use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(config::ServeArgs::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let state = build_http_state(&settings).await?;
    serve_http(&settings, state).await
}

async fn build_http_state(settings: &config::Settings) -> Result<HttpState, AppError> {
    let seed = SeedData::load(settings.data.seed_file.as_deref()).await?;
    let backend = Arc::new(InMemoryBackend::new(seed));

    let cache_config = CacheConfig::from(&settings.cache);
    let client = ApiClient::new(cache_config, RouteAdapter::new(backend));

    let storage: Arc<dyn PaginationStorage> = match settings.pagination.storage_file.as_ref() {
        Some(path) => {
            info!(path = %path.display(), "pagination state persisted to file");
            Arc::new(JsonFileStorage::new(path))
        }
        None => Arc::new(MemoryStorage::new()),
    };
    let admin = AdminService::new(
        client.clone(),
        storage,
        PaginationOptions::from(&settings.pagination),
    );

    Ok(HttpState::new(client, admin))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|source| InfraError::Bind {
            addr: settings.server.addr,
            source,
        })?;
    info!(
        addr = %settings.server.addr,
        cache_enabled = settings.cache.enabled,
        "postdeck listening"
    );

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = stop_tx.send(true);
        },
    );

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(&mut stop_rx, grace) => {
            warn!(grace_seconds = grace.as_secs(), "graceful shutdown timed out");
        }
    }

    info!("postdeck stopped");
    Ok(())
}

/// Resolves `grace` after shutdown has been requested.
async fn drain_deadline(stop_rx: &mut watch::Receiver<bool>, grace: Duration) {
    let requested = stop_rx.wait_for(|stopping| *stopping).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(grace).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
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
                warn!(error = %err, "failed to listen for SIGTERM");
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
