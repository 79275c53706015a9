use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::models::AppEvent;

/// Worker that emits [`AppEvent::TimerTick`] on a fixed period while the
/// dashboard is in the foreground. Hidden time does not count toward the
/// next tick; the dashboard does its own staleness check on return.
pub struct RefreshTimerWorker {
    events_tx: mpsc::Sender<AppEvent>,
    visibility: watch::Receiver<bool>,
    interval: Duration,
}

impl RefreshTimerWorker {
    pub fn new(
        events_tx: mpsc::Sender<AppEvent>,
        visibility: watch::Receiver<bool>,
        interval: Duration,
    ) -> Self {
        Self {
            events_tx,
            visibility,
            interval,
        }
    }

    /// Run until the dashboard goes away
    pub async fn run(mut self) {
        info!("Refresh timer started (interval: {:?})", self.interval);

        loop {
            // Suspended while hidden
            while !*self.visibility.borrow_and_update() {
                debug!("Refresh timer suspended");
                if self.visibility.changed().await.is_err() {
                    info!("Visibility source closed, stopping refresh timer");
                    return;
                }
            }

            let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if self.events_tx.send(AppEvent::TimerTick).await.is_err() {
                            warn!("Dashboard closed, stopping refresh timer");
                            return;
                        }
                    }
                    changed = self.visibility.changed() => {
                        if changed.is_err() {
                            info!("Visibility source closed, stopping refresh timer");
                            return;
                        }
                        if !*self.visibility.borrow_and_update() {
                            break;
                        }
                    }
                }
            }
        }
    }
}
