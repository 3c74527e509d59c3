//! Audio/video exclusivity
//!
//! At most one subsystem plays at a time. The synchronizer pauses itself
//! before, or right when, its subsystem stops being the active one.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::media_mode::MediaModeEvent;
use crate::model::MediaType;

use super::PlaybackSynchronizer;

impl PlaybackSynchronizer {
    /// Pauses this subsystem if it is the outgoing one, then switches.
    /// Returns false when `target` was already active.
    pub async fn switch_media_type(&self, target: MediaType) -> bool {
        let current = self.media_mode.current().await;
        if current == target {
            return false;
        }
        if current == self.subsystem {
            self.release_playback().await;
        }
        self.media_mode.switch_to(target).await
    }

    pub async fn toggle_media_type(&self) -> MediaType {
        let target = self.media_mode.current().await.other();
        self.switch_media_type(target).await;
        target
    }

    /// Whether play commands are currently accepted.
    pub async fn is_active(&self) -> bool {
        self.media_mode.is_active(self.subsystem).await
    }

    /// Pauses this subsystem when a switch is made directly on the mode
    /// controller.
    pub fn spawn_mode_watcher(&self) -> JoinHandle<()> {
        let controller = self.clone();
        let mut events = self.media_mode.subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(MediaModeEvent::Switched { from, to }) if from == controller.subsystem => {
                        tracing::debug!(to = to.as_str(), "Subsystem deactivated");
                        controller.release_playback().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Media mode watcher lagged");
                        if !controller.is_active().await {
                            controller.release_playback().await;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("Media mode watcher shutting down");
        })
    }

    async fn release_playback(&self) {
        let busy = {
            let model = self.model.lock().await;
            model.state().is_playing || model.element_state.is_playing() || model.pending_load.is_some()
        };
        if !busy {
            return;
        }
        tracing::info!(subsystem = self.subsystem.as_str(), "Pausing outgoing subsystem");
        if let Err(e) = self.pause().await {
            tracing::warn!(error = %e, "Could not pause outgoing subsystem");
        }
    }
}
