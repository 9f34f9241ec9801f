//! Video Feeds - A YouTube and Rumble video aggregator
//!
//! This crate fetches the latest uploads of configured YouTube channels,
//! YouTube playlists and Rumble channels, merges them newest first and
//! serves them as a dashboard widget.

pub mod aggregator;
pub mod config;
pub mod fetcher;
pub mod item;
pub mod provider;
pub mod render;
pub mod routes;
pub mod time;
pub mod transport;
pub mod widget;

#[cfg(test)]
mod fixtures;
