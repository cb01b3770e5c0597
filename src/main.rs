use clap::{Parser, ValueEnum};
use cloud_file_sync::config::SyncConfig;
use cloud_file_sync::infrastructure::{database, storage};
use cloud_file_sync::services::location::LocationResolver;
use cloud_file_sync::services::metadata_store::{MetadataStore, SeaOrmMetadataStore};
use cloud_file_sync::services::session::{SeaOrmSessionProvider, SessionProvider};
use cloud_file_sync::services::upload::UploadOrchestrator;
use cloud_file_sync::services::worker::{DropUploader, DropWorker};
use cloud_file_sync::utils::clock::{Clock, SystemClock};
use cloud_file_sync::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Api,
    Worker,
    All,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Service type to run (api, worker, all)
    #[arg(short, long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Port for the API server
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & logging
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cloud_file_sync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting cloud file sync [Mode: {:?}]...", args.mode);

    // 2. Common infrastructure
    let config = SyncConfig::from_env();
    info!(
        "📁 Drop directory: {} (scan every {}ms, conflicts: {})",
        config.drop_directory.display(),
        config.scan_interval.as_millis(),
        config.conflict_behavior.as_str()
    );

    let db = database::setup_database().await?;
    let remote = storage::setup_storage(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn MetadataStore> = Arc::new(SeaOrmMetadataStore::new(db.clone()));
    let sessions: Arc<dyn SessionProvider> =
        Arc::new(SeaOrmSessionProvider::new(db.clone(), clock.clone()));
    let orchestrator = Arc::new(UploadOrchestrator::new(
        LocationResolver::new(config.roots.clone(), clock.clone()),
        remote.clone(),
        store.clone(),
        config.conflict_behavior,
    ));

    // 3. Graceful shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut handles = Vec::new();

    // 4. Drop worker
    if matches!(args.mode, Mode::Worker | Mode::All) {
        let handler = Arc::new(DropUploader::new(
            orchestrator.clone(),
            store.clone(),
            sessions.clone(),
        ));
        let worker = DropWorker::new(&config, handler);
        let worker_shutdown = shutdown_rx.clone();

        handles.push(tokio::spawn(async move {
            worker.run(worker_shutdown).await;
        }));
        info!("👷 Drop worker initialized.");
    }

    // 5. API
    if matches!(args.mode, Mode::Api | Mode::All) {
        let state = AppState {
            db: db.clone(),
            orchestrator: orchestrator.clone(),
            sessions: sessions.clone(),
            remote: remote.clone(),
        };

        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            );

        let app = create_app(state).layer(trace_layer);
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("✅ API Server listening on: http://0.0.0.0:{}", args.port);
        info!("📖 OpenAPI document: http://localhost:{}/api-docs/openapi.json", args.port);

        let mut server_shutdown = shutdown_rx.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.changed().await;
                })
                .await
            {
                error!("❌ Server runtime error: {}", e);
            }
        }));
    }

    // 6. Wait for a signal, then let the worker finish its in-flight file
    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    info!("🛑 Shutting down services...");
    for handle in handles {
        if let Err(e) = handle.await {
            error!("Task ended abnormally: {}", e);
        }
    }

    info!("👋 Exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
