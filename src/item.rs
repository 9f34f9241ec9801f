use chrono::{DateTime, Utc};

/// Grey 16:9 placeholder used when a feed entry carries no thumbnail.
pub const PLACEHOLDER_THUMBNAIL: &str = "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='16' height='9'%3E%3Crect width='16' height='9' fill='%23ccc'/%3E%3C/svg%3E";

/// A video entry normalized from any provider.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub thumbnail_url: String,
    pub title: String,
    pub url: String,
    pub author: String,
    pub author_url: String,
    pub time_posted: DateTime<Utc>,
}

impl FeedItem {
    /// Short relative age ("5m", "3h", "2d") as shown on the video cards.
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        let seconds = (now - self.time_posted).num_seconds().max(0);

        match seconds {
            s if s < 60 => "now".to_string(),
            s if s < 3_600 => format!("{}m", s / 60),
            s if s < 86_400 => format!("{}h", s / 3_600),
            s if s < 30 * 86_400 => format!("{}d", s / 86_400),
            s if s < 365 * 86_400 => format!("{}mo", s / (30 * 86_400)),
            s => format!("{}y", s / (365 * 86_400)),
        }
    }
}

/// Orders items newest first. Ties keep no particular order.
pub fn sort_newest_first(items: &mut [FeedItem]) {
    items.sort_unstable_by(|a, b| b.time_posted.cmp(&a.time_posted));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn item_at(title: &str, time_posted: DateTime<Utc>) -> FeedItem {
        FeedItem {
            thumbnail_url: PLACEHOLDER_THUMBNAIL.to_string(),
            title: title.to_string(),
            url: format!("https://example.com/{}", title),
            author: "Author".to_string(),
            author_url: "https://example.com/author".to_string(),
            time_posted,
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let base = Utc.with_ymd_and_hms(2024, 12, 9, 12, 0, 0).unwrap();
        let mut items = vec![
            item_at("old", base - Duration::hours(2)),
            item_at("new", base),
            item_at("middle", base - Duration::hours(1)),
        ];

        sort_newest_first(&mut items);

        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "middle", "old"]);
    }

    #[test]
    fn test_sort_empty_slice() {
        let mut items: Vec<FeedItem> = Vec::new();
        sort_newest_first(&mut items);
        assert!(items.is_empty());
    }

    #[test]
    fn test_time_ago_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 12, 9, 12, 0, 0).unwrap();

        assert_eq!(item_at("a", now - Duration::seconds(10)).time_ago(now), "now");
        assert_eq!(item_at("a", now - Duration::minutes(5)).time_ago(now), "5m");
        assert_eq!(item_at("a", now - Duration::hours(3)).time_ago(now), "3h");
        assert_eq!(item_at("a", now - Duration::days(2)).time_ago(now), "2d");
        assert_eq!(item_at("a", now - Duration::days(65)).time_ago(now), "2mo");
        assert_eq!(item_at("a", now - Duration::days(800)).time_ago(now), "2y");
    }

    #[test]
    fn test_time_ago_future_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 12, 9, 12, 0, 0).unwrap();
        assert_eq!(item_at("a", now + Duration::hours(1)).time_ago(now), "now");
    }
}
