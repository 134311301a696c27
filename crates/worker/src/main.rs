use std::sync::Arc;

use anyhow::Context;
use raidsim_pipeline::WorkerLoop;
use raidsim_simbot::browser::webdriver::WebDriverBrowser;
use raidsim_simbot::driver::{AutomationDriver, DriverTimings, SimulationDriver};
use raidsim_simbot::extractor::{ExtractorConfig, ReportExtractor};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use raidsim_worker::config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "raidsim_worker=debug,raidsim_pipeline=debug,raidsim_simbot=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(
        browser = ?config.browser,
        webdriver_url = %config.webdriver_url,
        base_url = %config.simbot_base_url,
        "Loaded worker configuration",
    );

    // --- Database ---
    let pool = raidsim_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    raidsim_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    raidsim_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    // --- Browser ---
    let browser = WebDriverBrowser::connect(config.browser, &config.browser_config())
        .await
        .context("Failed to start WebDriver session")?;

    let timings = DriverTimings {
        report_timeout: config.sim_timeout(),
        ..DriverTimings::default()
    };
    let driver = Arc::new(SimulationDriver::with_timings(
        browser,
        config.simbot_base_url.clone(),
        timings,
    ));
    let extractor = Arc::new(
        ReportExtractor::new(ExtractorConfig {
            base_url: config.simbot_base_url.clone(),
            ..ExtractorConfig::default()
        })
            .context("Failed to build report HTTP client")?,
    );

    // --- Worker loop ---
    let cancel = CancellationToken::new();
    let shared_driver: Arc<dyn AutomationDriver> = driver.clone();
    let worker = WorkerLoop::new(pool.clone(), shared_driver, extractor)
        .with_poll_interval(config.poll_interval());

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    worker.run(cancel).await;
    drop(worker);

    // --- Cleanup ---
    match Arc::try_unwrap(driver) {
        Ok(driver) => {
            if let Err(e) = driver.into_browser().quit().await {
                tracing::warn!(error = %e, "Failed to quit WebDriver session");
            }
        }
        Err(_) => tracing::warn!("WebDriver session still shared at shutdown, not quitting"),
    }
    pool.close().await;

    tracing::info!("Worker shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM. The current job finishes before the loop
/// observes cancellation.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), stopping after current job"),
        () = terminate => tracing::info!("Received SIGTERM, stopping after current job"),
    }
}
