use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aggregator::{aggregate, AggregationResult, AggregationStatus};
use crate::config::WidgetConfig;
use crate::item::FeedItem;
use crate::transport::FeedTransport;

/// Refresh interval before the first cycle has run.
pub const INITIAL_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
/// Refresh interval right after the first cycle, so real data shows up quickly.
pub const FIRST_LOAD_REFRESH_INTERVAL: Duration = Duration::from_secs(3);
/// Refresh interval once the widget has settled.
pub const STEADY_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePhase {
    FirstLoad,
    Steady,
}

/// Everything the widget publishes to the render layer and the scheduler.
#[derive(Debug, Clone)]
pub struct WidgetState {
    pub phase: CachePhase,
    pub content_available: bool,
    pub items: Vec<FeedItem>,
    /// Outcome of the last completed cycle, `None` before the first one.
    pub status: Option<AggregationStatus>,
    pub failed: usize,
    pub refresh_interval: Duration,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self {
            phase: CachePhase::FirstLoad,
            content_available: false,
            items: Vec::new(),
            status: None,
            failed: 0,
            refresh_interval: INITIAL_REFRESH_INTERVAL,
        }
    }
}

impl WidgetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_first_load(&self) -> bool {
        self.phase == CachePhase::FirstLoad
    }

    /// State after a completed update cycle.
    ///
    /// The first cycle leaves the widget on a very short interval and moves
    /// it to [`CachePhase::Steady`] whatever the outcome; every later cycle
    /// extends the interval. There is no way back to `FirstLoad`.
    pub fn apply(self, result: AggregationResult) -> Self {
        let refresh_interval = if self.is_first_load() && !self.content_available {
            FIRST_LOAD_REFRESH_INTERVAL
        } else {
            STEADY_REFRESH_INTERVAL
        };

        Self {
            phase: CachePhase::Steady,
            content_available: true,
            items: result.items,
            status: Some(result.status),
            failed: result.failed,
            refresh_interval,
        }
    }
}

/// How a call to [`VideosWidget::update`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Completed,
    /// Another cycle of this widget was already running.
    Skipped,
    /// Cancelled before the fetch finished; state is untouched.
    Cancelled,
}

/// A videos widget: its configuration, its transport and the state its
/// update cycle publishes.
pub struct VideosWidget {
    config: WidgetConfig,
    transport: Arc<dyn FeedTransport>,
    state: RwLock<WidgetState>,
    refreshing: AtomicBool,
}

/// Clears the single-flight flag when the cycle ends, including when the
/// `update` future is dropped mid-flight.
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl VideosWidget {
    pub fn new(config: WidgetConfig, transport: Arc<dyn FeedTransport>) -> Self {
        Self {
            config,
            transport,
            state: RwLock::new(WidgetState::new()),
            refreshing: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    fn begin_refresh(&self) -> Option<RefreshGuard<'_>> {
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard(&self.refreshing))
    }

    pub async fn snapshot(&self) -> WidgetState {
        self.state.read().await.clone()
    }

    pub async fn refresh_interval(&self) -> Duration {
        self.state.read().await.refresh_interval
    }

    /// Runs one update cycle unless one is already in progress.
    ///
    /// The new state is published only when the cycle completes; a
    /// cancelled cycle leaves the previous state in place.
    pub async fn update(&self, cancel: &CancellationToken) -> UpdateOutcome {
        let Some(_guard) = self.begin_refresh() else {
            info!("Video refresh already in progress, skipping");
            return UpdateOutcome::Skipped;
        };

        if self.state.read().await.is_first_load() {
            info!("Video widget first load - fetching videos with short cache");
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = aggregate(self.transport.as_ref(), &self.config) => Some(result),
        };

        match result {
            Some(result) => {
                let mut state = self.state.write().await;
                let previous = std::mem::take(&mut *state);
                *state = previous.apply(result);
                info!(
                    count = state.items.len(),
                    refresh_secs = state.refresh_interval.as_secs(),
                    "Video content now available"
                );
                UpdateOutcome::Completed
            }
            None => {
                warn!("Video refresh cancelled, keeping previous content");
                UpdateOutcome::Cancelled
            }
        }
    }
}

/// Runs the first cycle immediately, then one cycle per refresh interval
/// until `shutdown` is cancelled.
pub async fn start_background_refresh(widget: Arc<VideosWidget>, shutdown: CancellationToken) {
    info!("Starting initial video fetch");

    loop {
        if widget.update(&shutdown).await == UpdateOutcome::Cancelled {
            break;
        }

        let interval = widget.refresh_interval().await;
        info!(secs = interval.as_secs(), "Next video refresh scheduled");

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!("Background video refresh stopped");
}
