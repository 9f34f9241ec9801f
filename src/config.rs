use serde::Deserialize;
use std::path::Path;

use crate::provider::PLAYLIST_PREFIX;
use crate::render::Style;
use crate::transport::DEFAULT_MAX_WORKERS;

const DEFAULT_LIMIT: usize = 25;
const DEFAULT_COLLAPSE_AFTER: i64 = 7;
const DEFAULT_COLLAPSE_AFTER_ROWS: i64 = 4;

/// Widget configuration as written in `videos.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_title")]
    pub title: String,
    /// YouTube channel ids
    #[serde(default)]
    pub channels: Vec<String>,
    /// YouTube playlist ids, fetched alongside `channels`
    #[serde(default)]
    pub playlists: Vec<String>,
    #[serde(default)]
    pub rumble_channels: Vec<String>,
    /// Link template with a `{VIDEO-ID}` placeholder, e.g. for an alternative frontend
    #[serde(default)]
    pub video_url_template: Option<String>,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub collapse_after: i64,
    #[serde(default)]
    pub collapse_after_rows: i64,
    #[serde(default)]
    pub include_shorts: bool,
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub http: HttpSettings,
}

fn default_title() -> String {
    "Videos".to_string()
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

/// Base URLs of the upstream feed services.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Endpoints {
    #[serde(default = "default_youtube_endpoint")]
    pub youtube: String,
    #[serde(default = "default_rumble_endpoint")]
    pub rumble: String,
}

fn default_youtube_endpoint() -> String {
    "https://www.youtube.com".to_string()
}

fn default_rumble_endpoint() -> String {
    "http://rumble-rss.xyz".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            youtube: default_youtube_endpoint(),
            rumble: default_rumble_endpoint(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_workers: default_max_workers(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

/// Configuration with defaults applied, as consumed by the widget.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub title: String,
    /// YouTube channel ids followed by `playlist:`-prefixed playlist ids
    pub youtube_sources: Vec<String>,
    pub rumble_sources: Vec<String>,
    pub video_url_template: Option<String>,
    pub style: Style,
    pub limit: usize,
    pub collapse_after: i64,
    pub collapse_after_rows: i64,
    pub include_shorts: bool,
    pub endpoints: Endpoints,
    pub max_workers: usize,
}

impl From<Config> for WidgetConfig {
    fn from(config: Config) -> Self {
        // Playlists live in their own list for the user but are fetched
        // together with channels, told apart by the prefix.
        let mut youtube_sources = config.channels;
        youtube_sources.extend(
            config
                .playlists
                .iter()
                .map(|id| format!("{}{}", PLAYLIST_PREFIX, id)),
        );

        let limit = if config.limit <= 0 {
            DEFAULT_LIMIT
        } else {
            config.limit as usize
        };

        let video_url_template = config
            .video_url_template
            .filter(|template| !template.trim().is_empty());

        Self {
            title: config.title,
            youtube_sources,
            rumble_sources: config.rumble_channels,
            video_url_template,
            style: Style::from_key(&config.style),
            limit,
            collapse_after: collapse_hint(config.collapse_after, DEFAULT_COLLAPSE_AFTER),
            collapse_after_rows: collapse_hint(
                config.collapse_after_rows,
                DEFAULT_COLLAPSE_AFTER_ROWS,
            ),
            include_shorts: config.include_shorts,
            endpoints: config.endpoints,
            max_workers: config.http.max_workers,
        }
    }
}

/// `-1` disables collapsing; zero and anything below `-1` mean "use the default".
fn collapse_hint(value: i64, default: i64) -> i64 {
    if value == 0 || value < -1 {
        default
    } else {
        value
    }
}
