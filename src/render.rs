use askama::Template;
use chrono::{DateTime, Utc};

use crate::aggregator::AggregationStatus;
use crate::config::WidgetConfig;
use crate::item::FeedItem;
use crate::widget::WidgetState;

/// Columns of the grid layout, kept in sync with `static/style.css`.
const GRID_COLUMNS: i64 = 4;

/// Presentation layout, selected by the `style` key of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    HorizontalCards,
    GridCards,
    VerticalList,
}

impl Style {
    /// Unknown keys fall back to horizontal cards.
    pub fn from_key(key: &str) -> Self {
        match key {
            "grid-cards" => Style::GridCards,
            "vertical-list" => Style::VerticalList,
            _ => Style::HorizontalCards,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Style::HorizontalCards => "horizontal-cards",
            Style::GridCards => "grid-cards",
            Style::VerticalList => "vertical-list",
        }
    }

    /// Number of items shown before the rest is folded away, if any.
    fn visible_items(self, config: &WidgetConfig) -> Option<usize> {
        let visible = match self {
            Style::HorizontalCards => return None,
            Style::GridCards if config.collapse_after_rows >= 0 => {
                config.collapse_after_rows * GRID_COLUMNS
            }
            Style::VerticalList if config.collapse_after >= 0 => config.collapse_after,
            _ => return None,
        };
        Some(visible as usize)
    }
}

pub struct VideoCard<'a> {
    pub item: &'a FeedItem,
    pub posted: String,
    pub posted_at: String,
}

impl<'a> VideoCard<'a> {
    fn new(item: &'a FeedItem, now: DateTime<Utc>) -> Self {
        Self {
            item,
            posted: item.time_ago(now),
            posted_at: item.time_posted.to_rfc3339(),
        }
    }
}

#[derive(Template)]
#[template(path = "widget_loading.html")]
pub struct LoadingTemplate<'a> {
    pub title: &'a str,
}

#[derive(Template)]
#[template(path = "widget_message.html")]
pub struct MessageTemplate<'a> {
    pub title: &'a str,
    pub message: &'a str,
}

#[derive(Template)]
#[template(path = "videos_horizontal.html")]
pub struct HorizontalCardsTemplate<'a> {
    pub title: &'a str,
    pub failed: usize,
    pub cards: Vec<VideoCard<'a>>,
}

#[derive(Template)]
#[template(path = "videos_grid.html")]
pub struct GridCardsTemplate<'a> {
    pub title: &'a str,
    pub failed: usize,
    pub cards: Vec<VideoCard<'a>>,
    pub more: Vec<VideoCard<'a>>,
}

#[derive(Template)]
#[template(path = "videos_vertical_list.html")]
pub struct VerticalListTemplate<'a> {
    pub title: &'a str,
    pub failed: usize,
    pub cards: Vec<VideoCard<'a>>,
    pub more: Vec<VideoCard<'a>>,
}

/// Renders the widget fragment for the current state.
///
/// Before the first completed cycle this is a loading placeholder that polls
/// for the real content.
pub fn render_widget(
    state: &WidgetState,
    config: &WidgetConfig,
    now: DateTime<Utc>,
) -> askama::Result<String> {
    let title = config.title.as_str();

    if !state.content_available {
        return LoadingTemplate { title }.render();
    }

    if state.items.is_empty() {
        let message = match state.status {
            Some(AggregationStatus::Failed) => "Could not load videos",
            _ => "No videos",
        };
        return MessageTemplate { title, message }.render();
    }

    let mut cards: Vec<VideoCard<'_>> = state
        .items
        .iter()
        .map(|item| VideoCard::new(item, now))
        .collect();
    let more = match config.style.visible_items(config) {
        Some(visible) if visible < cards.len() => cards.split_off(visible),
        _ => Vec::new(),
    };
    let failed = state.failed;

    match config.style {
        Style::HorizontalCards => HorizontalCardsTemplate {
            title,
            failed,
            cards,
        }
        .render(),
        Style::GridCards => GridCardsTemplate {
            title,
            failed,
            cards,
            more,
        }
        .render(),
        Style::VerticalList => VerticalListTemplate {
            title,
            failed,
            cards,
            more,
        }
        .render(),
    }
}
