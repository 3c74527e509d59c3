//! Command surface of the out-of-process audio engine
//!
//! Every call is asynchronous and may fail independently of the local media
//! element. `LocalEngine` is an in-process implementation holding the
//! authoritative state, used by the demo binary.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::playback::PlaybackState;

#[async_trait]
pub trait AudioEngine: Send + Sync {
    async fn play_audio(&self, file_path: &str) -> Result<()>;
    async fn pause_audio(&self) -> Result<()>;
    async fn resume_audio(&self) -> Result<()>;
    async fn stop_audio(&self) -> Result<()>;
    async fn set_volume(&self, volume: f64) -> Result<()>;
    async fn seek_to(&self, position: f64) -> Result<()>;
    async fn update_duration(&self, duration: f64) -> Result<()>;
    async fn get_playback_state(&self) -> Result<PlaybackState>;
}

/// Engine state kept in-process
#[derive(Default)]
pub struct LocalEngine {
    state: RwLock<PlaybackState>,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AudioEngine for LocalEngine {
    async fn play_audio(&self, file_path: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.current_track_id = Some(file_path.to_string());
        state.is_playing = true;
        state.position = 0.0;
        // The media element reports the real duration once metadata is in
        state.duration = 0.0;
        tracing::info!(file_path, "Engine playing");
        Ok(())
    }

    async fn pause_audio(&self) -> Result<()> {
        self.state.write().await.is_playing = false;
        tracing::debug!("Engine paused");
        Ok(())
    }

    async fn resume_audio(&self) -> Result<()> {
        self.state.write().await.is_playing = true;
        tracing::debug!("Engine resumed");
        Ok(())
    }

    async fn stop_audio(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.is_playing = false;
        state.current_track_id = None;
        state.position = 0.0;
        state.duration = 0.0;
        tracing::debug!("Engine stopped");
        Ok(())
    }

    async fn set_volume(&self, volume: f64) -> Result<()> {
        let mut state = self.state.write().await;
        state.volume = volume.clamp(0.0, 1.0);
        tracing::debug!(volume = state.volume, "Engine volume set");
        Ok(())
    }

    async fn seek_to(&self, position: f64) -> Result<()> {
        self.state.write().await.position = position.max(0.0);
        Ok(())
    }

    async fn update_duration(&self, duration: f64) -> Result<()> {
        self.state.write().await.duration = duration;
        tracing::debug!(duration, "Engine duration updated");
        Ok(())
    }

    async fn get_playback_state(&self) -> Result<PlaybackState> {
        Ok(self.state.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_play_resets_position_and_duration() {
        let engine = LocalEngine::new();
        engine.play_audio("/a.mp3").await.unwrap();
        engine.update_duration(180.0).await.unwrap();
        engine.seek_to(42.0).await.unwrap();

        engine.play_audio("/b.mp3").await.unwrap();
        let state = engine.get_playback_state().await.unwrap();
        assert_eq!(state.current_track_id.as_deref(), Some("/b.mp3"));
        assert!(state.is_playing);
        assert_eq!(state.position, 0.0);
        assert_eq!(state.duration, 0.0);
    }

    #[tokio::test]
    async fn test_stop_clears_track() {
        let engine = LocalEngine::new();
        engine.play_audio("/a.mp3").await.unwrap();
        engine.stop_audio().await.unwrap();

        let state = engine.get_playback_state().await.unwrap();
        assert!(!state.is_playing);
        assert!(state.current_track_id.is_none());
    }

    #[tokio::test]
    async fn test_volume_and_seek_are_clamped() {
        let engine = LocalEngine::new();
        engine.set_volume(1.7).await.unwrap();
        engine.seek_to(-3.0).await.unwrap();

        let state = engine.get_playback_state().await.unwrap();
        assert_eq!(state.volume, 1.0);
        assert_eq!(state.position, 0.0);
    }
}
