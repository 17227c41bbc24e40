use crate::config::Config;
use crate::error::PollerError;
use crate::models::Snapshot;
use crate::provider::DataProvider;
use crate::tasks::reconcile::{publish_if_newer, reconcile, TickCycle, TickResults};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    pub poll_interval: Duration,
    // A tick still unresolved after this long is discarded
    pub tick_timeout: Duration,
    pub generate_images: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            tick_timeout: Duration::from_secs(10),
            generate_images: false,
        }
    }
}

impl From<&Config> for PollerConfig {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval,
            tick_timeout: config.tick_timeout,
            generate_images: config.generate_images,
        }
    }
}

struct PollerLifecycle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Keeps a fresh [`Snapshot`] by querying the provider on a fixed cadence.
/// Consumers read the latest snapshot through [`Poller::subscribe`].
pub struct Poller<P: DataProvider + 'static> {
    provider: Arc<P>,
    config: PollerConfig,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    lifecycle: Mutex<Option<PollerLifecycle>>,
}

impl<P: DataProvider + 'static> Poller<P> {
    pub fn new(provider: Arc<P>, config: PollerConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot::initial()));
        Self {
            provider,
            config,
            snapshot_tx,
            lifecycle: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Fetches once right away, then every `poll_interval` until [`Poller::stop`].
    /// Outside a tokio runtime this fails with [`PollerError::NoRuntime`].
    pub fn start(&self) -> Result<(), PollerError> {
        if self.config.poll_interval.is_zero() {
            return Err(PollerError::InvalidInterval);
        }

        let runtime = Handle::try_current().map_err(|_| PollerError::NoRuntime)?;

        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if lifecycle.is_some() {
            return Err(PollerError::AlreadyRunning);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let provider = Arc::clone(&self.provider);
        let config = self.config.clone();
        let snapshot_tx = self.snapshot_tx.clone();

        info!(
            "Starting poller (interval {:?}, images {})",
            config.poll_interval,
            if config.generate_images { "on" } else { "off" }
        );
        let task = runtime.spawn(async move {
            run_poll_loop(provider, config, snapshot_tx, shutdown_rx).await;
        });

        *lifecycle = Some(PollerLifecycle { shutdown_tx, task });
        Ok(())
    }

    /// Cancels the schedule and any in-flight tick. Once this returns no
    /// further snapshot is published. Safe to call when not running.
    pub async fn stop(&self) {
        let lifecycle = self
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(PollerLifecycle { shutdown_tx, task }) = lifecycle else {
            return;
        };

        let _ = shutdown_tx.send(true);
        if let Err(e) = task.await {
            error!("Poller task ended abnormally: {}", e);
        }
        info!("Poller stopped");
    }
}

impl<P: DataProvider + 'static> Drop for Poller<P> {
    fn drop(&mut self) {
        let lifecycle = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(PollerLifecycle { shutdown_tx, task }) = lifecycle {
            let _ = shutdown_tx.send(true);
            task.abort();
        }
    }
}

async fn fetch_all<P: DataProvider + ?Sized>(provider: &P, generate_images: bool) -> TickResults {
    let image = async {
        if generate_images {
            Some(provider.generate_image().await)
        } else {
            None
        }
    };

    let (proposals, story_history, time_info, generated_image) = tokio::join!(
        provider.proposals(),
        provider.story_history(),
        provider.time_info(),
        image
    );

    TickResults {
        proposals,
        story_history,
        time_info,
        generated_image,
    }
}

// Only the tick currently in Fetching may publish
fn publish_tick(
    cycle: &mut TickCycle,
    snapshot_tx: &watch::Sender<Arc<Snapshot>>,
    tick: u64,
    results: TickResults,
) -> bool {
    if !cycle.publishing(tick) {
        warn!("Tick {} is not the tick in flight ({:?}), dropped", tick, cycle.phase());
        return false;
    }

    let previous = snapshot_tx.borrow().clone();
    let snapshot = reconcile(&previous, tick, results);
    let proposals = snapshot.proposals.len();
    let entries = snapshot.story_history.len();

    if publish_if_newer(snapshot_tx, snapshot) {
        debug!(
            "Tick {} published ({} proposals, {} story entries)",
            tick, proposals, entries
        );
        true
    } else {
        warn!("Tick {} is older than the published snapshot, dropped", tick);
        false
    }
}

async fn run_poll_loop<P: DataProvider + ?Sized>(
    provider: Arc<P>,
    config: PollerConfig,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // The first tick of a tokio interval fires immediately
    let mut ticker = interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cycle = TickCycle::new(snapshot_tx.borrow().tick);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        // Ticks are awaited inline, so begin() only refuses if a tick was never finished
        let Some(tick) = cycle.begin() else {
            warn!("Previous tick still in flight, deferring");
            continue;
        };
        debug!("Tick {} fetching", tick);

        let fetched = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            fetched = timeout(config.tick_timeout, fetch_all(provider.as_ref(), config.generate_images)) => fetched,
        };

        match fetched {
            Ok(results) => {
                if *shutdown_rx.borrow() {
                    break;
                }
                publish_tick(&mut cycle, &snapshot_tx, tick, results);
            }
            Err(_) => {
                error!(
                    "Tick {} did not resolve within {:?}, discarded",
                    tick, config.tick_timeout
                );
            }
        }

        cycle.finish();
    }

    debug!("Poll loop exited");
}
