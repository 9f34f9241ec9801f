//! Rumble channels, read through a Rumble-to-RSS bridge.

use quick_xml::events::{BytesStart, Event};
use quick_xml::NsReader;
use tracing::debug;

use super::{attribute, cdata, decode_error, element_name, text, ElementPath};
use crate::item::{FeedItem, PLACEHOLDER_THUMBNAIL};
use crate::time::{self, TimeFormat};
use crate::transport::FetchError;

pub fn feed_url(base: &str, channel: &str) -> String {
    format!("{}/rumble/{}", base, channel)
}

#[derive(Debug, Default)]
pub struct RumbleFeed {
    pub channel: String,
    pub channel_link: String,
    pub items: Vec<RumbleItem>,
}

#[derive(Debug, Default)]
pub struct RumbleItem {
    pub title: String,
    pub published: String,
    /// The bridge puts the video page URL in `<guid>`.
    pub link: String,
    pub media_thumbnail: String,
    pub itunes_image: String,
}

const RSS: &[u8] = b"rss";
const CHANNEL: &[u8] = b"channel";
const ITEM: &[u8] = b"item";

const CHANNEL_TITLE: &[&[u8]] = &[RSS, CHANNEL, b"title"];
const CHANNEL_LINK: &[&[u8]] = &[RSS, CHANNEL, b"link"];
const ITEM_PATH: &[&[u8]] = &[RSS, CHANNEL, ITEM];
const ITEM_TITLE: &[&[u8]] = &[RSS, CHANNEL, ITEM, b"title"];
const ITEM_PUB_DATE: &[&[u8]] = &[RSS, CHANNEL, ITEM, b"pubDate"];
const ITEM_GUID: &[&[u8]] = &[RSS, CHANNEL, ITEM, b"guid"];
const ITEM_MEDIA_THUMBNAIL: &[&[u8]] = &[RSS, CHANNEL, ITEM, b"media:thumbnail"];
const ITEM_ITUNES_IMAGE: &[&[u8]] = &[RSS, CHANNEL, ITEM, b"itunes:image"];

pub fn decode(body: &str) -> Result<RumbleFeed, FetchError> {
    let mut reader = NsReader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut feed = RumbleFeed::default();
    let mut item: Option<RumbleItem> = None;
    let mut path = ElementPath::default();
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(decode_error)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = element_name(&reader, e);
                if path.is_empty() && name != RSS {
                    return Err(FetchError::Decode(format!(
                        "expected <rss> root, found <{}>",
                        String::from_utf8_lossy(&name)
                    )));
                }
                saw_root |= path.is_empty();
                if let Some(item) = item.as_mut() {
                    read_item_attributes(&path, &name, e, item)?;
                }
                if matches!(event, Event::Start(_)) {
                    path.push(name);
                    if path.is(ITEM_PATH) {
                        item = Some(RumbleItem::default());
                    }
                }
            }
            Event::End(_) => {
                if path.is(ITEM_PATH) {
                    if let Some(done) = item.take() {
                        feed.items.push(done);
                    }
                }
                path.pop();
            }
            Event::Text(e) => append_text(&path, &text(&e)?, &mut feed, item.as_mut()),
            Event::CData(e) => append_text(&path, &cdata(&e), &mut feed, item.as_mut()),
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(FetchError::Decode("document has no <rss> element".to_string()));
    }

    Ok(feed)
}

fn read_item_attributes(
    path: &ElementPath,
    name: &[u8],
    start: &BytesStart<'_>,
    item: &mut RumbleItem,
) -> Result<(), FetchError> {
    if path.child_is(name, ITEM_MEDIA_THUMBNAIL) && item.media_thumbnail.is_empty() {
        if let Some(url) = attribute(start, "url")? {
            item.media_thumbnail = url;
        }
    } else if path.child_is(name, ITEM_ITUNES_IMAGE) && item.itunes_image.is_empty() {
        // iTunes feeds use `href`; some bridges emit `url`.
        if let Some(url) = attribute(start, "href")?.or(attribute(start, "url")?) {
            item.itunes_image = url;
        }
    }
    Ok(())
}

fn append_text(path: &ElementPath, value: &str, feed: &mut RumbleFeed, item: Option<&mut RumbleItem>) {
    if path.is(CHANNEL_TITLE) {
        feed.channel.push_str(value);
    } else if path.is(CHANNEL_LINK) {
        feed.channel_link.push_str(value);
    } else if let Some(item) = item {
        if path.is(ITEM_TITLE) {
            item.title.push_str(value);
        } else if path.is(ITEM_PUB_DATE) {
            item.published.push_str(value);
        } else if path.is(ITEM_GUID) {
            item.link.push_str(value);
        }
    }
}

impl RumbleFeed {
    /// Rumble links carry no video id parameter, so URL templates do not apply.
    pub fn into_items(self) -> Vec<FeedItem> {
        let channel = self.channel;
        let channel_link = self.channel_link;

        self.items
            .into_iter()
            .filter(|item| {
                let keep = !item.title.is_empty() && !item.link.is_empty();
                if !keep {
                    debug!(channel = %channel, title = %item.title, "Skipping rumble item without title or link");
                }
                keep
            })
            .map(|item| {
                let thumbnail_url = [item.media_thumbnail, item.itunes_image]
                    .into_iter()
                    .find(|url| !url.is_empty())
                    .unwrap_or_else(|| PLACEHOLDER_THUMBNAIL.to_string());

                FeedItem {
                    thumbnail_url,
                    title: item.title,
                    url: item.link,
                    author: channel.clone(),
                    author_url: channel_link.clone(),
                    time_posted: time::parse(&item.published, TimeFormat::Rumble),
                }
            })
            .collect()
    }
}
