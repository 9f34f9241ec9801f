use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::config::WidgetConfig;
use crate::fetcher::{NoContent, ProviderFetcher, ProviderOutcome};
use crate::item::{sort_newest_first, FeedItem};
use crate::provider::{FetchOptions, Provider};
use crate::transport::FeedTransport;

/// Number of published items echoed to the debug log after each cycle.
const LOGGED_ITEMS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationStatus {
    /// Every configured provider delivered without errors, or nothing was configured.
    Complete,
    /// Some sources failed, but items were collected.
    Partial,
    /// Sources were configured and none of them produced an item.
    Failed,
}

#[derive(Debug, Clone)]
pub struct AggregationResult {
    /// Newest first, truncated to the configured limit.
    pub items: Vec<FeedItem>,
    /// Number of sources that failed across all providers.
    pub failed: usize,
    pub status: AggregationStatus,
}

/// Runs every provider that has sources configured and merges their items.
///
/// Providers are fetched in parallel and independently: a provider that
/// comes back empty or broken only loses its own items.
pub async fn aggregate(transport: &dyn FeedTransport, config: &WidgetConfig) -> AggregationResult {
    let options = FetchOptions {
        video_url_template: config.video_url_template.clone(),
        include_shorts: config.include_shorts,
    };

    let configured = [
        (Provider::YouTube, &config.youtube_sources),
        (Provider::Rumble, &config.rumble_sources),
    ];

    let fetches = configured
        .into_iter()
        .filter(|(_, sources)| !sources.is_empty())
        .map(|(provider, sources)| {
            let fetcher = ProviderFetcher {
                provider,
                transport,
                endpoints: &config.endpoints,
                options: options.clone(),
                max_workers: config.max_workers,
            };
            async move { fetcher.fetch(sources).await }
        });

    let outcomes = join_all(fetches).await;
    combine(outcomes, config.limit)
}

/// Folds per-provider outcomes into one published result.
pub fn combine(outcomes: Vec<Result<ProviderOutcome, NoContent>>, limit: usize) -> AggregationResult {
    let mut batches = Vec::with_capacity(outcomes.len());
    let mut failed = 0;
    let mut had_error = false;

    for outcome in outcomes {
        match outcome {
            Ok(outcome) => {
                if let Some(partial) = outcome.partial() {
                    warn!(error = %partial, "Provider returned partial content");
                    had_error = true;
                }
                info!(
                    provider = outcome.provider.name(),
                    count = outcome.items.len(),
                    "Fetched videos"
                );
                failed += outcome.failed;
                batches.push(outcome.items);
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch videos");
                failed += e.failed;
                had_error = true;
            }
        }
    }

    let collected: usize = batches.iter().map(Vec::len).sum();
    let items = merge(batches, limit);

    let status = if !had_error {
        AggregationStatus::Complete
    } else if collected > 0 {
        AggregationStatus::Partial
    } else {
        AggregationStatus::Failed
    };

    for (index, item) in items.iter().take(LOGGED_ITEMS).enumerate() {
        debug!(
            index,
            title = %item.title,
            author = %item.author,
            url = %item.url,
            time = %item.time_posted,
            "Video data"
        );
    }
    info!(total = items.len(), collected, failed, status = ?status, "Video aggregation complete");

    AggregationResult {
        items,
        failed,
        status,
    }
}

/// Concatenates the batches, sorts newest first and keeps at most `limit` items.
pub fn merge(batches: Vec<Vec<FeedItem>>, limit: usize) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = batches.into_iter().flatten().collect();
    sort_newest_first(&mut items);
    items.truncate(limit);
    items
}
