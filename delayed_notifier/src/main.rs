//! Grounded on `fechatter_server/src/main.rs` (load config, init tracing,
//! build state, serve) and `analytics_server/src/main.rs`'s graceful
//! shutdown via a ctrl_c task plus `with_graceful_shutdown`.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use delayed_notifier::{build_state, connect_and_migrate, connect_bus, get_router, AppConfig};

/// spec.md §5: "HTTP server has a 5-second shutdown grace."
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = AppConfig::load().expect("failed to load configuration");

  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)))
    .init();

  // A failed migration is a fatal startup error (spec.md §6).
  let pool = connect_and_migrate(&config.sql).await?;
  let bus_channel = connect_bus(&config.bus).await?;

  let port = config.server.port;
  let (state, sender_cancellation) = build_state(config, pool, bus_channel).await?;
  let app = get_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], port));
  let listener = TcpListener::bind(addr).await?;
  info!("delayed_notifier listening on {addr}");

  axum::serve(listener, app.into_make_service())
    .with_graceful_shutdown(async move {
      tokio::signal::ctrl_c().await.ok();
      info!("shutdown signal received, draining in-flight requests for up to {SHUTDOWN_GRACE:?}");
      sender_cancellation.cancel();

      // The grace period races draining against a hard exit so a stuck
      // connection can't hang the process forever.
      tokio::spawn(async move {
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        warn!("shutdown grace period elapsed, forcing exit");
        std::process::exit(1);
      });
    })
    .await?;

  info!("delayed_notifier shut down cleanly");
  Ok(())
}
