//! Feed documents for tests.

use chrono::{DateTime, Utc};

pub(crate) fn youtube_feed(channel: &str, videos: &[(&str, DateTime<Utc>)]) -> String {
    let entries: String = videos
        .iter()
        .map(|(id, published)| {
            format!(
                r#"
 <entry>
  <id>yt:video:{id}</id>
  <title>{id}</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v={id}"/>
  <published>{published}</published>
  <media:group>
   <media:thumbnail url="https://i.ytimg.com/vi/{id}/hqdefault.jpg" width="480" height="360"/>
  </media:group>
 </entry>"#,
                id = id,
                published = published.format("%Y-%m-%dT%H:%M:%S+00:00"),
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <title>{channel}</title>
 <author>
  <name>{channel}</name>
  <uri>https://www.youtube.com/channel/{channel}</uri>
 </author>{entries}
</feed>"#,
        channel = channel,
        entries = entries,
    )
}

pub(crate) fn rumble_feed(channel: &str, videos: &[(&str, DateTime<Utc>)]) -> String {
    let items: String = videos
        .iter()
        .map(|(id, published)| {
            format!(
                r#"
    <item>
      <title>{id}</title>
      <pubDate>{published}</pubDate>
      <guid>https://rumble.com/{id}.html</guid>
    </item>"#,
                id = id,
                published = published.format("%a, %d %b %Y %H:%M:%S GMT"),
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>{channel}</title>
    <link>https://rumble.com/c/{channel}</link>{items}
  </channel>
</rss>"#,
        channel = channel,
        items = items,
    )
}
