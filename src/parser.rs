//! Wire decoding of GTFS-realtime messages.

use anyhow::{Context, Result};
use prost::Message;
use tracing::debug;

use crate::gtfs_rt::FeedMessage;

/// Decodes a protobuf-encoded [`FeedMessage`].
///
/// # Errors
///
/// Returns an error if the bytes are not a valid `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage> {
    let feed = FeedMessage::decode(bytes).context("invalid GTFS-realtime FeedMessage")?;
    debug!(
        bytes = bytes.len(),
        entities = feed.entity.len(),
        version = %feed.header.gtfs_realtime_version,
        "Decoded feed"
    );
    Ok(feed)
}
