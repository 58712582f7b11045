use std::net::{IpAddr, SocketAddr};

use subcult_api::{
    AppState, config::Config, database, middleware::RateLimiters, patreon::PatreonClient, router,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting subcult api server");

    // 加载配置
    let config = Config::from_env().map_err(|e| {
        tracing::error!("Failed to load configuration (DATABASE_URL and JWT_SECRET are required): {}", e);
        e
    })?;

    // 数据库连接池 + 迁移
    let pool = database::connect(&config).await?;
    tracing::info!("Database connected");

    database::migrate(&pool).await?;
    tracing::info!("Migrations applied");

    if let Err(e) = database::seed_admin(&pool, &config).await {
        tracing::warn!("Failed to seed admin user: {}", e);
    }

    let patreon = PatreonClient::from_config(&config)?;
    if !patreon.enabled() {
        tracing::info!("Patreon credentials not configured, campaign endpoint disabled");
    }

    let state = AppState {
        pool,
        config: config.clone(),
        patreon,
    };

    // 限流器及其后台清理任务
    let shutdown = CancellationToken::new();
    let limiters = RateLimiters::from_config(&config);
    let sweepers = limiters.spawn_sweepers(&shutdown);

    let app = router::build(state, &limiters);

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await?;

    for sweeper in sweepers {
        if let Err(e) = sweeper.await {
            tracing::warn!("Rate limit sweeper ended abnormally: {}", e);
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }

    shutdown.cancel();
}
