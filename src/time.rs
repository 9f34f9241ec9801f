use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

/// Value some Rumble bridges emit in place of a missing publish date.
const INVALID_DATE: &str = "Invalid Date";

/// Timestamp dialect of a provider's feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// Atom `<published>` values, e.g. `2024-12-09T12:00:00+00:00`.
    YouTube,
    /// RSS `<pubDate>` values, e.g. `Mon, 09 Dec 2024 12:00:00 GMT`.
    Rumble,
}

enum Layout {
    /// Layout carries its own numeric offset.
    WithOffset(&'static str),
    /// Layout is implicitly UTC (literal `Z` or `GMT`).
    Utc(&'static str),
}

impl Layout {
    fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            Layout::WithOffset(fmt) => DateTime::parse_from_str(raw, fmt)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Layout::Utc(fmt) => NaiveDateTime::parse_from_str(raw, fmt)
                .ok()
                .map(|naive| naive.and_utc()),
        }
    }
}

const YOUTUBE_LAYOUTS: &[Layout] = &[
    Layout::WithOffset("%Y-%m-%dT%H:%M:%S%:z"),
    Layout::Utc("%Y-%m-%dT%H:%M:%SZ"),
];

// Matched after the weekday prefix is stripped.
const RUMBLE_LAYOUTS: &[Layout] = &[
    Layout::Utc("%d %b %Y %H:%M:%S GMT"),
    Layout::Utc("%e %b %Y %H:%M:%S GMT"),
    Layout::WithOffset("%d %b %Y %H:%M:%S %z"),
];

impl TimeFormat {
    fn layouts(self) -> &'static [Layout] {
        match self {
            TimeFormat::YouTube => YOUTUBE_LAYOUTS,
            TimeFormat::Rumble => RUMBLE_LAYOUTS,
        }
    }

    fn prepare(self, raw: &str) -> &str {
        match self {
            TimeFormat::YouTube => raw,
            TimeFormat::Rumble => strip_weekday(raw),
        }
    }
}

/// Drops a leading `Mon, ` style weekday. The date alone decides the instant.
fn strip_weekday(raw: &str) -> &str {
    match raw.split_once(", ") {
        Some((day, rest)) if day.len() == 3 && day.chars().all(|c| c.is_ascii_alphabetic()) => {
            rest
        }
        _ => raw,
    }
}

/// Tries each accepted layout for `format` in order and returns the first match.
pub fn try_parse(raw: &str, format: TimeFormat) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == INVALID_DATE {
        return None;
    }

    let raw = format.prepare(raw);
    format.layouts().iter().find_map(|layout| layout.parse(raw))
}

/// Parses a feed timestamp, falling back to the current time.
///
/// A bad timestamp never fails the item it belongs to. Every fallback is
/// logged so that an upstream format change shows up in the logs instead of
/// silently reordering the list.
pub fn parse(raw: &str, format: TimeFormat) -> DateTime<Utc> {
    if let Some(parsed) = try_parse(raw, format) {
        return parsed;
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == INVALID_DATE {
        debug!(raw = %raw, format = ?format, "Missing feed timestamp, using current time");
    } else {
        warn!(raw = %raw, format = ?format, "Unrecognized feed timestamp, using current time");
    }

    Utc::now()
}
