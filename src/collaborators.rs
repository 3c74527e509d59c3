//! Narrow interfaces to the code surrounding the player

use anyhow::Result;
use async_trait::async_trait;

use crate::model::TrackNotification;

/// Maps a track's file path to something the local element can load.
/// Must be pure and cheap; called on every load.
pub trait SourceResolver: Send + Sync {
    fn to_playable_source(&self, file_path: &str) -> String;
}

/// `asset://localhost/<percent-encoded path>`
#[derive(Clone, Copy, Debug, Default)]
pub struct AssetResolver;

impl SourceResolver for AssetResolver {
    fn to_playable_source(&self, file_path: &str) -> String {
        format!("asset://localhost/{}", urlencoding::encode(file_path))
    }
}

/// Receives "track started" notifications. Failures are logged only.
#[async_trait]
pub trait TrackNotifier: Send + Sync {
    async fn track_started(&self, track: &TrackNotification) -> Result<()>;
}

/// Writes notifications to the log
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl TrackNotifier for LogNotifier {
    async fn track_started(&self, track: &TrackNotification) -> Result<()> {
        tracing::info!(
            title = %track.title,
            artist = %track.artist,
            album = %track.album,
            file_path = %track.file_path,
            "Now playing"
        );
        Ok(())
    }
}
