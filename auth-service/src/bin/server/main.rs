use std::sync::Arc;
use std::time::Duration;

use auth::TokenCodec;
use auth_service::config::Config;
use auth_service::domain::auth::gatekeeper::Gatekeeper;
use auth_service::domain::auth::service::AuthService;
use auth_service::domain::clock::Clock;
use auth_service::domain::clock::SystemClock;
use auth_service::domain::token::cache::TokenCache;
use auth_service::domain::token::ports::TokenServicePort;
use auth_service::domain::token::service::TokenService;
use auth_service::inbound::grpc::AuthGrpcService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::cache::MokaCacheStore;
use auth_service::outbound::events::KafkaNotificationProducer;
use auth_service::outbound::repositories::PostgresTokenRepository;
use auth_service::outbound::repositories::PostgresUserRepository;
use auth_service::proto::auth_service_server::AuthServiceServer;
use sqlx::postgres::PgPoolOptions;
use tonic::transport::Server;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        grpc_port = config.server.grpc_port,
        kafka_brokers = %config.kafka.brokers,
        kafka_topic = %config.kafka.notification_topic,
        sweep_interval_seconds = config.ledger.sweep_interval_seconds,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let settings = config.jwt.token_settings();
    let cache = Arc::new(TokenCache::new(Arc::new(MokaCacheStore::new(
        config.cache.max_capacity,
    ))));

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let token_repository = Arc::new(PostgresTokenRepository::new(pg_pool));
    let notification_producer = Arc::new(KafkaNotificationProducer::new(&config)?);

    let token_service = Arc::new(TokenService::new(
        token_repository,
        Arc::clone(&cache),
        TokenCodec::new(config.jwt.secret.as_bytes()),
        settings,
        Arc::clone(&clock),
    ));
    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&user_repository),
        Arc::clone(&token_service),
        notification_producer,
        Arc::clone(&cache),
        settings,
        clock,
    ));
    let gatekeeper = Arc::new(Gatekeeper::new(
        user_repository,
        Arc::clone(&token_service),
        cache,
        config.cache.profile_ttl(),
    ));

    if config.ledger.sweep_interval_seconds > 0 {
        spawn_sweeper(
            Arc::clone(&token_service),
            Duration::from_secs(config.ledger.sweep_interval_seconds),
        );
    }

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        auth_service,
        token_service,
        gatekeeper.clone(),
    );
    let http_server =
        tokio::spawn(async move { axum::serve(http_listener, http_application).await });

    let grpc_address = format!("0.0.0.0:{}", config.server.grpc_port).parse()?;
    let grpc_service = AuthGrpcService::new(gatekeeper);
    tracing::info!(
        address = %grpc_address,
        port = config.server.grpc_port,
        protocol = "grpc",
        "gRpc server listening"
    );

    let grpc_server = tokio::spawn(async move {
        Server::builder()
            .add_service(AuthServiceServer::new(grpc_service))
            .serve(grpc_address)
            .await
    });

    match tokio::try_join!(http_server, grpc_server) {
        Ok((_, _)) => tracing::info!("Servers exited successfully"),
        Err(e) => tracing::error!(error = %e, "Server error"),
    };

    Ok(())
}

/// Periodically remove expired rows from the token ledger.
fn spawn_sweeper<T: TokenServicePort>(tokens: Arc<T>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match tokens.purge_expired().await {
                Ok(removed) => tracing::debug!(removed, "Expired tokens purged"),
                Err(e) => tracing::warn!(error = %e, "Periodic token sweep failed"),
            }
        }
    });
}
