//! Upstream video providers.
//!
//! Each provider has its own feed-URL scheme, document shape and timestamp
//! dialect. [`Provider`] dispatches to the matching module, and
//! [`ProviderDocument`] holds a decoded feed until it is normalized into
//! [`FeedItem`]s.

pub mod rumble;
pub mod youtube;

use std::borrow::Cow;

use quick_xml::events::{BytesCData, BytesStart, BytesText};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::config::Endpoints;
use crate::item::FeedItem;
use crate::transport::FetchError;

/// Marks a YouTube source as a playlist rather than a channel.
pub const PLAYLIST_PREFIX: &str = "playlist:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    YouTube,
    Rumble,
}

/// Per-provider options that shape requests and normalization.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub video_url_template: Option<String>,
    pub include_shorts: bool,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::YouTube => "youtube",
            Provider::Rumble => "rumble",
        }
    }

    /// Builds the feed URL for one source identifier.
    ///
    /// Malformed identifiers still yield a URL; the fetch reports the failure.
    pub fn feed_url(self, endpoints: &Endpoints, source: &str, options: &FetchOptions) -> String {
        match self {
            Provider::YouTube => youtube::feed_url(&endpoints.youtube, source, options.include_shorts),
            Provider::Rumble => rumble::feed_url(&endpoints.rumble, source),
        }
    }

    pub fn decode(self, body: &str) -> Result<ProviderDocument, FetchError> {
        match self {
            Provider::YouTube => youtube::decode(body).map(ProviderDocument::YouTube),
            Provider::Rumble => rumble::decode(body).map(ProviderDocument::Rumble),
        }
    }
}

/// A decoded feed document of one provider.
#[derive(Debug)]
pub enum ProviderDocument {
    YouTube(youtube::YoutubeFeed),
    Rumble(rumble::RumbleFeed),
}

impl ProviderDocument {
    pub fn into_items(self, options: &FetchOptions) -> Vec<FeedItem> {
        let template = options.video_url_template.as_deref();
        match self {
            ProviderDocument::YouTube(feed) => feed.into_items(template),
            ProviderDocument::Rumble(feed) => feed.into_items(),
        }
    }
}

fn decode_error(err: impl std::fmt::Display) -> FetchError {
    FetchError::Decode(err.to_string())
}

/// Namespaces matched under a fixed prefix, whatever prefix the document binds.
const KNOWN_NAMESPACES: &[(&[u8], &[u8])] = &[
    (b"http://search.yahoo.com/mrss/", b"media"),
    (b"http://www.itunes.com/dtds/podcast-1.0.dtd", b"itunes"),
];

/// Name of `start` as the path constants spell it.
///
/// Elements of a [`KNOWN_NAMESPACES`] entry get its prefix. Other prefixed
/// elements bound to a namespace become `{uri}local`, so a borrowed prefix
/// never matches. Unprefixed and undeclared names are kept as written.
fn element_name(reader: &NsReader<&[u8]>, start: &BytesStart<'_>) -> Vec<u8> {
    let qname = start.name();
    let (resolved, local) = reader.resolve_element(qname);
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => {
            let known = KNOWN_NAMESPACES.iter().find(|(known, _)| *known == uri);
            let mut name = Vec::new();
            match known {
                Some((_, prefix)) => {
                    name.extend_from_slice(prefix);
                    name.push(b':');
                }
                None if qname.prefix().is_some() => {
                    name.push(b'{');
                    name.extend_from_slice(uri);
                    name.push(b'}');
                }
                None => {}
            }
            name.extend_from_slice(local.as_ref());
            name
        }
        _ => qname.as_ref().to_vec(),
    }
}

/// Element path from the document root, by [`element_name`].
#[derive(Debug, Default)]
struct ElementPath(Vec<Vec<u8>>);

impl ElementPath {
    fn push(&mut self, name: Vec<u8>) {
        self.0.push(name);
    }

    fn pop(&mut self) {
        self.0.pop();
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn is(&self, path: &[&[u8]]) -> bool {
        self.0.len() == path.len() && self.0.iter().zip(path).all(|(a, b)| a.as_slice() == *b)
    }

    /// Whether an element `name`, opened at the current path, is the element at `path`.
    fn child_is(&self, name: &[u8], path: &[&[u8]]) -> bool {
        match path.split_last() {
            Some((last, parent)) => name == *last && self.is(parent),
            None => false,
        }
    }
}

fn attribute(start: &BytesStart<'_>, key: &str) -> Result<Option<String>, FetchError> {
    match start.try_get_attribute(key).map_err(decode_error)? {
        Some(attr) => {
            let value = attr.unescape_value().map_err(decode_error)?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

fn text(event: &BytesText<'_>) -> Result<String, FetchError> {
    event
        .unescape()
        .map(Cow::into_owned)
        .map_err(decode_error)
}

fn cdata(event: &BytesCData<'_>) -> String {
    String::from_utf8_lossy(event).into_owned()
}
