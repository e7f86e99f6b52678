//! Periodic Refresher
//!
//! Re-runs the aggregation on a fixed interval and publishes the latest
//! result as a `Snapshot`. At most one aggregation runs at a time: a tick
//! that fires while a refresh is still in flight is skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::time::MissedTickBehavior;

use super::aggregator::{AggregationReport, Aggregator};
use crate::domain::PairDetail;

/// Latest successful aggregation
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Increments with each published snapshot, starting at 1
    pub generation: u64,
    pub refreshed_at: DateTime<Utc>,
    pub pairs: Vec<PairDetail>,
    pub report: AggregationReport,
}

/// What a single refresh attempt did
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A new snapshot was published
    Completed { generation: u64, pairs: usize },
    /// Another refresh was already in flight
    Skipped,
    /// The aggregation aborted; the previous snapshot is kept
    Failed(String),
    /// Shutdown was requested mid-run
    Cancelled,
}

/// Status snapshot of the refresher
#[derive(Debug, Clone)]
pub struct RefresherStatus {
    pub is_running: bool,
    pub interval: Duration,
    pub generation: u64,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Clone)]
pub struct Refresher {
    aggregator: Arc<Aggregator>,
    interval: Duration,
    snapshot: Arc<RwLock<Option<Snapshot>>>,
    last_error: Arc<RwLock<Option<String>>>,
    in_flight: Arc<Mutex<()>>,
    is_running: Arc<RwLock<bool>>,
    shutdown: Arc<watch::Sender<bool>>,
    published: Arc<watch::Sender<u64>>,
}

impl Refresher {
    pub fn new(aggregator: Arc<Aggregator>, interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        let (published, _) = watch::channel(0);

        Self {
            aggregator,
            interval,
            snapshot: Arc::new(RwLock::new(None)),
            last_error: Arc::new(RwLock::new(None)),
            in_flight: Arc::new(Mutex::new(())),
            is_running: Arc::new(RwLock::new(false)),
            shutdown: Arc::new(shutdown),
            published: Arc::new(published),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one aggregation unless one is already in flight
    pub async fn refresh_once(&self) -> RefreshOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!("Refresh already in progress, skipping");
            return RefreshOutcome::Skipped;
        };

        let mut shutdown = self.shutdown.subscribe();
        let outcome = self
            .aggregator
            .run_until(async move {
                let stopped = shutdown.wait_for(|stop| *stop).await.is_ok();
                if !stopped {
                    std::future::pending::<()>().await;
                }
            })
            .await;

        if outcome.report.cancelled {
            return RefreshOutcome::Cancelled;
        }
        if let Some(reason) = outcome.report.aborted.clone() {
            tracing::warn!("Refresh failed, keeping previous snapshot: {}", reason);
            *self.last_error.write().await = Some(reason.clone());
            return RefreshOutcome::Failed(reason);
        }

        let pairs = outcome.pairs.len();
        let generation = {
            let mut snapshot = self.snapshot.write().await;
            let generation = snapshot.as_ref().map_or(0, |s| s.generation) + 1;
            *snapshot = Some(Snapshot {
                generation,
                refreshed_at: Utc::now(),
                pairs: outcome.pairs,
                report: outcome.report,
            });
            generation
        };
        *self.last_error.write().await = None;
        self.published.send_replace(generation);

        tracing::info!("Snapshot {} published with {} tokens", generation, pairs);
        RefreshOutcome::Completed { generation, pairs }
    }

    /// Refresh on every interval tick until `stop` is called. Each tick runs
    /// in its own task so a slow refresh does not delay the schedule.
    pub async fn run(&self) {
        let mut shutdown = self.shutdown.subscribe();
        let stopped = *shutdown.borrow_and_update();
        if stopped {
            return;
        }
        *self.is_running.write().await = true;

        tracing::info!("Starting refresher - interval: {:?}", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // Checked on the receiver so a stop racing with startup is not missed
            let stopped = *shutdown.borrow_and_update();
            if stopped {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    let refresher = self.clone();
                    tokio::spawn(async move {
                        refresher.refresh_once().await;
                    });
                }
                _ = shutdown.changed() => {}
            }
        }

        *self.is_running.write().await = false;
        tracing::info!("Refresher stopped");
    }

    /// Stop the loop and cancel any in-flight refresh
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        self.shutdown.send_replace(true);
        tracing::info!("Stopping refresher...");
    }

    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.snapshot.read().await.clone()
    }

    /// Receiver that changes to the generation of each published snapshot
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.published.subscribe()
    }

    pub async fn status(&self) -> RefresherStatus {
        let snapshot = self.snapshot.read().await;
        RefresherStatus {
            is_running: *self.is_running.read().await,
            interval: self.interval,
            generation: snapshot.as_ref().map_or(0, |s| s.generation),
            last_refresh: snapshot.as_ref().map(|s| s.refreshed_at),
            last_error: self.last_error.read().await.clone(),
        }
    }
}
