use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fixture_board::api::{HttpTransport, RequestScheduler};
use fixture_board::app::{parse_command, Command, Dashboard, HELP};
use fixture_board::config::Config;
use fixture_board::db::CacheStore;
use fixture_board::models::AppEvent;
use fixture_board::render::LogRenderer;
use fixture_board::sync::SyncOrchestrator;
use fixture_board::workers::RefreshTimerWorker;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fixture_board=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting fixture-board");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded (provider: {}, date: {})",
        config.provider,
        config
            .match_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "today".to_string())
    );

    // Initialize cache
    let store = Arc::new(CacheStore::new(&config.database_url, config.cache_expiry).await?);

    // Initialize provider pipeline
    let transport = HttpTransport::new(config.request_timeout)?;
    let scheduler = RequestScheduler::new(
        transport,
        config.min_request_spacing,
        config.request_timeout,
    );
    let orchestrator = Arc::new(SyncOrchestrator::new(
        scheduler,
        Arc::clone(&store),
        config.endpoint(),
        config.match_date,
        config.retry_policy(),
    ));
    info!("Sync pipeline initialized");

    let dashboard = Dashboard::new(
        Arc::clone(&orchestrator),
        Arc::clone(&store),
        LogRenderer::new(),
    )
    .await;
    let events = dashboard.events();

    let refresh_timer =
        RefreshTimerWorker::new(events.clone(), dashboard.visibility(), config.refresh_interval);
    let timer_handle = tokio::spawn(async move {
        refresh_timer.run().await;
    });

    let quit = CancellationToken::new();
    tokio::spawn(read_commands(events, quit.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = quit.cancelled() => {
            info!("Quit requested");
        }
        _ = dashboard.run() => {
            error!("Dashboard exited unexpectedly");
        }
        result = timer_handle => {
            error!("Refresh timer exited unexpectedly: {:?}", result);
        }
    }

    orchestrator.shutdown();
    info!("Shutting down fixture-board");
    Ok(())
}

/// Turn stdin lines into dashboard events
async fn read_commands(events: mpsc::Sender<AppEvent>, quit: CancellationToken) {
    info!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Input closed; dashboard keeps running until Ctrl-C");
                return;
            }
            Err(e) => {
                warn!("Failed to read input: {}", e);
                return;
            }
        };

        match parse_command(&line) {
            Some(Command::Event(event)) => {
                if events.send(event).await.is_err() {
                    return;
                }
            }
            Some(Command::Help) => info!("{}", HELP),
            Some(Command::Quit) => {
                quit.cancel();
                return;
            }
            None if line.trim().is_empty() => {}
            None => warn!("Unknown command '{}'. {}", line.trim(), HELP),
        }
    }
}
