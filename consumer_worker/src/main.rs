use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use consumer_worker::{build_service, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = AppConfig::load().expect("failed to load configuration");

  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      EnvFilter::new(config.log_level.clone().unwrap_or_else(|| "info".to_string()))
    }))
    .init();

  let service = build_service(&config).await?;
  let cancellation = tokio_util::sync::CancellationToken::new();

  let cancel_for_signal = cancellation.clone();
  tokio::spawn(async move {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("shutdown signal received");
    cancel_for_signal.cancel();
  });

  service.run(cancellation).await?;
  tracing::info!("consumer_worker shut down cleanly");
  Ok(())
}
