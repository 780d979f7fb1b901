use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agora::cache::{run_prefetch_loop, ResultCache};
use agora::clock::{Clock, SystemClock};
use agora::config::AppConfig;
use agora::notify::LogMailer;
use agora::scheduler::run_scheduler_loop;
use agora::server::{build_router, AppState};
use agora::store::{MemoryRecomputeQueue, MemoryStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(ResultCache::new());
    let recompute = Arc::new(MemoryRecomputeQueue::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let shutdown = CancellationToken::new();

    tokio::spawn(run_prefetch_loop(
        Arc::clone(&cache),
        Arc::clone(&store),
        config.prefetch_poll_interval,
        shutdown.clone(),
    ));

    if config.scheduler_enabled {
        tokio::spawn(run_scheduler_loop(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::new(LogMailer),
            clock,
            config.scheduler_poll_interval,
            shutdown.clone(),
        ));
    } else {
        tracing::info!("notification scheduler disabled in this environment");
    }

    let app = build_router(AppState::new(cache, store, recompute));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
            shutdown.cancel();
        })
        .await
        .unwrap();
}
