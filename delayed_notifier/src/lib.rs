//! # delayed_notifier
//!
//! The producer half of the delayed notification pipeline: an HTTP CRUD
//! surface backed by Postgres and a Redis read-through cache, plus a
//! background sender service that walks due notifications onto the bus.
//!
//! Grounded on `notify_server/src/lib.rs`'s `get_router` shape (one
//! `Router::new()` per auth tier, merged, then `.with_state`), simplified
//! to this service's single, unauthenticated tier.

pub mod config;
pub mod domains;
pub mod error;
pub mod handlers;
pub mod infra;
pub mod ports;
pub mod service;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use sqlx::PgPool;
use tokio::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::AppConfig;
pub use error::AppError;

use domains::notification::PostgresNotificationRepository;
use infra::{RabbitMqPublisher, RedisNotificationCache};
use ports::NotificationCacheRepository;
use service::SenderService;

pub type AppSenderService = SenderService<PostgresNotificationRepository, RabbitMqPublisher>;

#[derive(Clone)]
pub struct AppState {
  pub pool: Arc<PgPool>,
  pub repository: Arc<PostgresNotificationRepository>,
  pub cache: Arc<dyn NotificationCacheRepository>,
  pub bus: lapin::Channel,
  pub sender_service: Arc<AppSenderService>,
  pub config: Arc<AppConfig>,
  /// Shared with the sender service ticker; the fast-path publish spawned
  /// after create observes it too, so shutdown doesn't leave detached
  /// publish tasks running past process exit (spec.md §5).
  pub shutdown: tokio_util::sync::CancellationToken,
}

/// Connects to Postgres, runs pending migrations, and returns the pool
/// (spec.md §6: "migrations run automatically at startup; a failed
/// migration is a fatal startup error").
pub async fn connect_and_migrate(config: &config::SqlConfig) -> anyhow::Result<PgPool> {
  let pool = sqlx::postgres::PgPoolOptions::new()
    .max_connections(config.pool_size)
    .max_lifetime(Duration::from_secs(config.max_conn_lifetime_secs))
    .connect(&config.master_dsn)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;
  info!("database migrations applied");
  Ok(pool)
}

/// Builds the AMQP channel used by both `RabbitMqPublisher` and anything
/// else that needs to talk to the bus, and declares the exchange this
/// service publishes onto.
pub async fn connect_bus(config: &config::BusConfig) -> anyhow::Result<lapin::Channel> {
  use lapin::options::ExchangeDeclareOptions;
  use lapin::types::FieldTable;
  use lapin::{Connection, ConnectionProperties, ExchangeKind};

  let connection = Connection::connect(&config.amqp_uri(), ConnectionProperties::default()).await?;
  let channel = connection.create_channel().await?;
  channel
    .exchange_declare(
      &config.exchange,
      ExchangeKind::Direct,
      ExchangeDeclareOptions { durable: true, ..Default::default() },
      FieldTable::default(),
    )
    .await?;
  Ok(channel)
}

/// Assembles `AppState` from a loaded config, an already-migrated pool, and
/// an already-connected bus channel, then starts the background sender
/// service ticker (spec.md §4.1).
pub async fn build_state(
  config: AppConfig,
  pool: PgPool,
  bus_channel: lapin::Channel,
) -> anyhow::Result<(AppState, tokio_util::sync::CancellationToken)> {
  let pool = Arc::new(pool);
  let repository = Arc::new(PostgresNotificationRepository::new(pool.clone(), config.retry.sql));
  let cache: Arc<dyn NotificationCacheRepository> = Arc::new(
    RedisNotificationCache::connect(
      &config.cache.address,
      config.cache.password.as_deref(),
      config.cache.db,
      config.cache.ttl_secs,
      config.retry.cache,
    )
    .await?,
  );
  let publisher = Arc::new(RabbitMqPublisher::new(
    bus_channel.clone(),
    config.bus.exchange.clone(),
    config.retry.bus,
  ));

  let sender_service = Arc::new(SenderService::new(
    Duration::from_secs(config.fetcher.fetch_period_seconds),
    Duration::from_secs(config.fetcher.normalized_max_diapason_seconds()),
    repository.clone(),
    publisher,
  ));

  let cancellation = tokio_util::sync::CancellationToken::new();
  tokio::spawn(sender_service.clone().run(cancellation.clone()));

  let config = Arc::new(config);
  Ok((
    AppState {
      pool,
      repository,
      cache,
      bus: bus_channel,
      sender_service,
      config,
      shutdown: cancellation.clone(),
    },
    cancellation,
  ))
}

pub fn get_router(state: AppState) -> Router {
  let notify_routes = Router::new()
    .route("/notify", post(handlers::notify::create_notification))
    .route(
      "/notify/{id}",
      get(handlers::notify::get_notification).delete(handlers::notify::delete_notification),
    );

  let health_routes = Router::new().route("/health", get(handlers::health::health_check));

  Router::new()
    .merge(notify_routes)
    .merge(health_routes)
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(state)
}
