//! YouTube Atom feeds (`/feeds/videos.xml`).

use quick_xml::events::{BytesStart, Event};
use quick_xml::NsReader;
use url::Url;

use super::{attribute, cdata, decode_error, element_name, text, ElementPath, PLAYLIST_PREFIX};
use crate::item::{FeedItem, PLACEHOLDER_THUMBNAIL};
use crate::time::{self, TimeFormat};
use crate::transport::FetchError;

/// Placeholder replaced by the video id in a URL template.
pub const VIDEO_ID_PLACEHOLDER: &str = "{VIDEO-ID}";

/// Link used when a templated URL cannot be built.
pub const FALLBACK_URL: &str = "#";

const CHANNEL_PREFIX: &str = "UC";
/// Uploads playlist of a channel without shorts and live streams.
const LONG_FORM_UPLOADS_PREFIX: &str = "UULF";

pub fn feed_url(base: &str, source: &str, include_shorts: bool) -> String {
    if let Some(playlist_id) = source.strip_prefix(PLAYLIST_PREFIX) {
        format!("{}/feeds/videos.xml?playlist_id={}", base, playlist_id)
    } else if !include_shorts && source.starts_with(CHANNEL_PREFIX) {
        let playlist_id = source.replacen(CHANNEL_PREFIX, LONG_FORM_UPLOADS_PREFIX, 1);
        format!("{}/feeds/videos.xml?playlist_id={}", base, playlist_id)
    } else {
        format!("{}/feeds/videos.xml?channel_id={}", base, source)
    }
}

#[derive(Debug, Default)]
pub struct YoutubeFeed {
    pub channel: String,
    pub channel_link: String,
    pub entries: Vec<YoutubeEntry>,
}

#[derive(Debug, Default)]
pub struct YoutubeEntry {
    pub title: String,
    pub published: String,
    pub link: String,
    pub thumbnail: String,
}

const FEED: &[u8] = b"feed";
const ENTRY: &[u8] = b"entry";

const AUTHOR_NAME: &[&[u8]] = &[FEED, b"author", b"name"];
const AUTHOR_URI: &[&[u8]] = &[FEED, b"author", b"uri"];
const ENTRY_PATH: &[&[u8]] = &[FEED, ENTRY];
const ENTRY_TITLE: &[&[u8]] = &[FEED, ENTRY, b"title"];
const ENTRY_PUBLISHED: &[&[u8]] = &[FEED, ENTRY, b"published"];
const ENTRY_LINK: &[&[u8]] = &[FEED, ENTRY, b"link"];
const ENTRY_THUMBNAIL: &[&[u8]] = &[FEED, ENTRY, b"media:group", b"media:thumbnail"];

pub fn decode(body: &str) -> Result<YoutubeFeed, FetchError> {
    let mut reader = NsReader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut feed = YoutubeFeed::default();
    let mut entry: Option<YoutubeEntry> = None;
    let mut path = ElementPath::default();
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(decode_error)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = element_name(&reader, e);
                if path.is_empty() {
                    if name != FEED {
                        return Err(FetchError::Decode(format!(
                            "expected <feed> root, found <{}>",
                            String::from_utf8_lossy(&name)
                        )));
                    }
                    saw_root = true;
                }
                if let Some(entry) = entry.as_mut() {
                    read_entry_attributes(&path, &name, e, entry)?;
                }
                if matches!(event, Event::Start(_)) {
                    path.push(name);
                    if path.is(ENTRY_PATH) {
                        entry = Some(YoutubeEntry::default());
                    }
                }
            }
            Event::End(_) => {
                if path.is(ENTRY_PATH) {
                    if let Some(done) = entry.take() {
                        feed.entries.push(done);
                    }
                }
                path.pop();
            }
            Event::Text(e) => append_text(&path, &text(&e)?, &mut feed, entry.as_mut()),
            Event::CData(e) => append_text(&path, &cdata(&e), &mut feed, entry.as_mut()),
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(FetchError::Decode("document has no <feed> element".to_string()));
    }

    Ok(feed)
}

fn read_entry_attributes(
    path: &ElementPath,
    name: &[u8],
    start: &BytesStart<'_>,
    entry: &mut YoutubeEntry,
) -> Result<(), FetchError> {
    if path.child_is(name, ENTRY_LINK) && entry.link.is_empty() {
        if let Some(href) = attribute(start, "href")? {
            entry.link = href;
        }
    } else if path.child_is(name, ENTRY_THUMBNAIL) && entry.thumbnail.is_empty() {
        if let Some(url) = attribute(start, "url")? {
            entry.thumbnail = url;
        }
    }
    Ok(())
}

fn append_text(
    path: &ElementPath,
    value: &str,
    feed: &mut YoutubeFeed,
    entry: Option<&mut YoutubeEntry>,
) {
    if path.is(AUTHOR_NAME) {
        feed.channel.push_str(value);
    } else if path.is(AUTHOR_URI) {
        feed.channel_link.push_str(value);
    } else if let Some(entry) = entry {
        if path.is(ENTRY_TITLE) {
            entry.title.push_str(value);
        } else if path.is(ENTRY_PUBLISHED) {
            entry.published.push_str(value);
        }
    }
}

/// Substitutes the `v` parameter of a watch link into `template`.
///
/// Returns [`FALLBACK_URL`] when the link is not a valid URL.
pub fn rewrite_video_url(template: &str, link: &str) -> String {
    match Url::parse(link) {
        Ok(parsed) => {
            let video_id = parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default();
            template.replace(VIDEO_ID_PLACEHOLDER, &video_id)
        }
        Err(_) => FALLBACK_URL.to_string(),
    }
}

impl YoutubeFeed {
    pub fn into_items(self, video_url_template: Option<&str>) -> Vec<FeedItem> {
        let author_url = format!("{}/videos", self.channel_link);

        self.entries
            .into_iter()
            .map(|entry| {
                let url = match video_url_template {
                    Some(template) => rewrite_video_url(template, &entry.link),
                    None => entry.link,
                };

                let thumbnail_url = if entry.thumbnail.is_empty() {
                    PLACEHOLDER_THUMBNAIL.to_string()
                } else {
                    entry.thumbnail
                };

                FeedItem {
                    thumbnail_url,
                    title: entry.title,
                    url,
                    author: self.channel.clone(),
                    author_url: author_url.clone(),
                    time_posted: time::parse(&entry.published, TimeFormat::YouTube),
                }
            })
            .collect()
    }
}
