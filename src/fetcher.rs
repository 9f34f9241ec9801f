use thiserror::Error;
use tracing::{error, info};

use crate::config::Endpoints;
use crate::item::{sort_newest_first, FeedItem};
use crate::provider::{FetchOptions, Provider};
use crate::transport::{run_concurrently, FeedTransport, TransportSetupError};

/// Typical number of entries in one upstream feed document.
const ENTRIES_PER_FEED: usize = 15;

/// A provider produced no usable items in this cycle.
#[derive(Debug, Error)]
#[error("{provider}: no content available ({failed} of {requested} sources failed)")]
pub struct NoContent {
    pub provider: &'static str,
    pub failed: usize,
    pub requested: usize,
    /// Set when the worker pool could not start at all.
    #[source]
    pub setup: Option<TransportSetupError>,
}

/// Some sources of a provider failed, but others produced items.
#[derive(Debug, Error)]
#[error("{provider}: partial content, missing videos from {failed} sources")]
pub struct PartialContent {
    pub provider: &'static str,
    pub failed: usize,
}

/// Items collected from one provider, newest first.
#[derive(Debug)]
pub struct ProviderOutcome {
    pub provider: Provider,
    pub items: Vec<FeedItem>,
    pub failed: usize,
}

impl ProviderOutcome {
    /// The soft error to report alongside the items, if any source failed.
    pub fn partial(&self) -> Option<PartialContent> {
        (self.failed > 0).then(|| PartialContent {
            provider: self.provider.name(),
            failed: self.failed,
        })
    }
}

/// Fetches and normalizes every source of one provider.
pub struct ProviderFetcher<'a> {
    pub provider: Provider,
    pub transport: &'a dyn FeedTransport,
    pub endpoints: &'a Endpoints,
    pub options: FetchOptions,
    pub max_workers: usize,
}

impl ProviderFetcher<'_> {
    /// One attempt per source. A failing source is counted and logged but
    /// never aborts the rest of the batch.
    pub async fn fetch(&self, sources: &[String]) -> Result<ProviderOutcome, NoContent> {
        let provider = self.provider;
        let urls: Vec<String> = sources
            .iter()
            .map(|source| provider.feed_url(self.endpoints, source, &self.options))
            .collect();

        info!(provider = provider.name(), sources = sources.len(), "Fetching feeds");

        let responses = run_concurrently(self.transport, &urls, self.max_workers, |body| {
            provider.decode(body)
        })
        .await
        .map_err(|e| NoContent {
            provider: provider.name(),
            failed: sources.len(),
            requested: sources.len(),
            setup: Some(e),
        })?;

        let mut items = Vec::with_capacity(sources.len() * ENTRIES_PER_FEED);
        let mut failed = 0;

        for (source, response) in sources.iter().zip(responses) {
            match response {
                Ok(document) => items.extend(document.into_items(&self.options)),
                Err(e) => {
                    failed += 1;
                    error!(provider = provider.name(), source = %source, error = %e, "Failed to fetch feed");
                }
            }
        }

        if items.is_empty() {
            return Err(NoContent {
                provider: provider.name(),
                failed,
                requested: sources.len(),
                setup: None,
            });
        }

        sort_newest_first(&mut items);

        Ok(ProviderOutcome {
            provider,
            items,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{rumble_feed, youtube_feed};
    use crate::item::PLACEHOLDER_THUMBNAIL;
    use crate::transport::fake::FakeTransport;
    use crate::transport::DEFAULT_MAX_WORKERS;
    use chrono::{Duration, TimeZone, Utc};

    const YT: &str = "https://yt.test";
    const RUMBLE: &str = "http://rumble.test";

    fn endpoints() -> Endpoints {
        Endpoints {
            youtube: YT.to_string(),
            rumble: RUMBLE.to_string(),
        }
    }

    fn sources(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn fetcher<'a>(
        provider: Provider,
        transport: &'a FakeTransport,
        endpoints: &'a Endpoints,
        options: FetchOptions,
    ) -> ProviderFetcher<'a> {
        ProviderFetcher {
            provider,
            transport,
            endpoints,
            options,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    fn channel_url(id: &str) -> String {
        format!("{}/feeds/videos.xml?channel_id={}", YT, id)
    }

    mod youtube_fetch_tests {
        use super::*;

        #[tokio::test]
        async fn test_one_failed_source_is_partial_content() {
            let t = Utc.with_ymd_and_hms(2024, 12, 9, 12, 0, 0).unwrap();
            let body = youtube_feed(
                "good",
                &[
                    ("b", t - Duration::hours(1)),
                    ("a", t),
                    ("c", t - Duration::hours(2)),
                ],
            );
            let transport = FakeTransport::new()
                .with_body(&channel_url("good"), &body)
                .with_status(&channel_url("bad"), 500);
            let endpoints = endpoints();
            let options = FetchOptions {
                include_shorts: true,
                ..Default::default()
            };

            let outcome = fetcher(Provider::YouTube, &transport, &endpoints, options)
                .fetch(&sources(&["bad", "good"]))
                .await
                .unwrap();

            assert_eq!(outcome.failed, 1);
            let titles: Vec<_> = outcome.items.iter().map(|i| i.title.as_str()).collect();
            assert_eq!(titles, vec!["a", "b", "c"]);

            let partial = outcome.partial().unwrap();
            assert_eq!(partial.failed, 1);
            assert_eq!(partial.provider, "youtube");
        }

        #[tokio::test]
        async fn test_all_sources_ok_is_not_partial() {
            let t = Utc::now();
            let transport = FakeTransport::new()
                .with_body(&channel_url("one"), &youtube_feed("one", &[("x", t)]))
                .with_body(&channel_url("two"), &youtube_feed("two", &[("y", t)]));
            let endpoints = endpoints();
            let options = FetchOptions {
                include_shorts: true,
                ..Default::default()
            };

            let outcome = fetcher(Provider::YouTube, &transport, &endpoints, options)
                .fetch(&sources(&["one", "two"]))
                .await
                .unwrap();

            assert_eq!(outcome.items.len(), 2);
            assert_eq!(outcome.failed, 0);
            assert!(outcome.partial().is_none());
        }

        #[tokio::test]
        async fn test_shorts_excluded_requests_uploads_playlist() {
            let t = Utc::now();
            let url = format!("{}/feeds/videos.xml?playlist_id=UULFchan", YT);
            let transport = FakeTransport::new().with_body(&url, &youtube_feed("UCchan", &[("v1", t)]));
            let endpoints = endpoints();

            let outcome = fetcher(Provider::YouTube, &transport, &endpoints, FetchOptions::default())
                .fetch(&sources(&["UCchan"]))
                .await
                .unwrap();

            assert_eq!(outcome.items.len(), 1);
        }

        #[tokio::test]
        async fn test_playlist_source() {
            let t = Utc::now();
            let url = format!("{}/feeds/videos.xml?playlist_id=PL1", YT);
            let transport = FakeTransport::new().with_body(&url, &youtube_feed("list", &[("v1", t)]));
            let endpoints = endpoints();

            let outcome = fetcher(Provider::YouTube, &transport, &endpoints, FetchOptions::default())
                .fetch(&sources(&["playlist:PL1"]))
                .await
                .unwrap();

            assert_eq!(outcome.items[0].author, "list");
        }

        #[tokio::test]
        async fn test_url_template_is_applied() {
            let t = Utc::now();
            let transport = FakeTransport::new()
                .with_body(&channel_url("chan"), &youtube_feed("chan", &[("abc", t)]));
            let endpoints = endpoints();
            let options = FetchOptions {
                video_url_template: Some("https://yewtu.be/watch?v={VIDEO-ID}".to_string()),
                include_shorts: true,
            };

            let outcome = fetcher(Provider::YouTube, &transport, &endpoints, options)
                .fetch(&sources(&["chan"]))
                .await
                .unwrap();

            assert_eq!(outcome.items[0].url, "https://yewtu.be/watch?v=abc");
        }

        #[tokio::test]
        async fn test_all_sources_failed_is_no_content() {
            let transport = FakeTransport::new();
            let endpoints = endpoints();

            let err = fetcher(Provider::YouTube, &transport, &endpoints, FetchOptions::default())
                .fetch(&sources(&["UCa", "UCb"]))
                .await
                .unwrap_err();

            assert_eq!(err.failed, 2);
            assert_eq!(err.requested, 2);
            assert!(err.setup.is_none());
        }

        #[tokio::test]
        async fn test_empty_feeds_are_no_content() {
            let transport = FakeTransport::new().with_body(&channel_url("quiet"), &youtube_feed("quiet", &[]));
            let endpoints = endpoints();
            let options = FetchOptions {
                include_shorts: true,
                ..Default::default()
            };

            let err = fetcher(Provider::YouTube, &transport, &endpoints, options)
                .fetch(&sources(&["quiet"]))
                .await
                .unwrap_err();

            assert_eq!(err.failed, 0);
        }

        #[tokio::test]
        async fn test_undecodable_document_counts_as_failure() {
            let t = Utc::now();
            let transport = FakeTransport::new()
                .with_body(&channel_url("html"), "<html><body>consent wall</body></html>")
                .with_body(&channel_url("ok"), &youtube_feed("ok", &[("v", t)]));
            let endpoints = endpoints();
            let options = FetchOptions {
                include_shorts: true,
                ..Default::default()
            };

            let outcome = fetcher(Provider::YouTube, &transport, &endpoints, options)
                .fetch(&sources(&["html", "ok"]))
                .await
                .unwrap();

            assert_eq!(outcome.failed, 1);
            assert_eq!(outcome.items.len(), 1);
        }

        #[tokio::test]
        async fn test_setup_failure_is_no_content() {
            let transport = FakeTransport::new();
            let endpoints = endpoints();
            let mut fetcher = fetcher(Provider::YouTube, &transport, &endpoints, FetchOptions::default());
            fetcher.max_workers = 0;

            let err = fetcher.fetch(&sources(&["UCa"])).await.unwrap_err();

            assert!(matches!(err.setup, Some(TransportSetupError::NoWorkers)));
            assert_eq!(transport.calls(), 0);
        }
    }

    mod rumble_fetch_tests {
        use super::*;

        #[tokio::test]
        async fn test_rumble_items_ignore_template() {
            let t = Utc::now();
            let transport = FakeTransport::new().with_body(
                &format!("{}/rumble/Show", RUMBLE),
                &rumble_feed("Show", &[("ep1", t)]),
            );
            let endpoints = endpoints();
            let options = FetchOptions {
                video_url_template: Some("https://yewtu.be/watch?v={VIDEO-ID}".to_string()),
                include_shorts: false,
            };

            let outcome = fetcher(Provider::Rumble, &transport, &endpoints, options)
                .fetch(&sources(&["Show"]))
                .await
                .unwrap();

            assert_eq!(outcome.items[0].url, "https://rumble.com/ep1.html");
            assert_eq!(outcome.items[0].thumbnail_url, PLACEHOLDER_THUMBNAIL);
            assert_eq!(outcome.items[0].author, "Show");
        }
    }
}
