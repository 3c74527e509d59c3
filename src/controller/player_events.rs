//! Media element event handling and end-of-track policy

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::audio::{ElementState, MediaEvent};
use crate::error::PlayerError;
use crate::model::{Direction, Optimistic, PlaybackMode, PlaybackState};

use super::{PlaybackSynchronizer, SyncEvent};

impl PlaybackSynchronizer {
    /// Drains element events until the sending side goes away.
    pub fn spawn_event_listener(&self, mut events: mpsc::UnboundedReceiver<MediaEvent>) -> JoinHandle<()> {
        let controller = self.clone();
        tracing::info!("Starting media event listener");

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                controller.handle_media_event(event).await;
            }
            tracing::debug!("Media event listener shutting down");
        })
    }

    pub async fn handle_media_event(&self, event: MediaEvent) {
        {
            let mut model = self.model.lock().await;
            if model.loaded_source.as_deref() != Some(event.source()) {
                tracing::trace!(event = event.name(), source = event.source(), "Ignoring event for a replaced source");
                return;
            }
            model.element_state = model.element_state.on_event(&event);
        }

        match event {
            MediaEvent::LoadedMetadata { source, duration } => {
                tracing::debug!(source = %source, duration, "loadedmetadata");
                self.start_loaded_track(&source, duration).await;
            }
            MediaEvent::TimeUpdate { position, .. } => {
                tracing::trace!(position, "timeupdate");
                self.on_time_update(position).await;
            }
            MediaEvent::Ended { source } => {
                tracing::debug!(source = %source, "ended");
                self.on_track_ended().await;
            }
            MediaEvent::Play { .. } | MediaEvent::Pause { .. } => {
                tracing::trace!(event = event.name(), "Element play state changed");
                self.reconcile().await;
            }
            MediaEvent::Error { source, message } => {
                tracing::warn!(source = %source, message = %message, "Media element error");
                self.on_media_error(message).await;
            }
        }
    }

    async fn on_time_update(&self, position: f64) {
        {
            let mut model = self.model.lock().await;
            let state = PlaybackState {
                position,
                ..model.state().clone()
            };
            self.publish(&mut model, state);
        }
        if let Err(e) = self.engine.seek_to(position).await {
            tracing::trace!(error = %e, "Engine position update failed");
        }
    }

    /// Aborts any start in flight and pauses both sides. No retry on element
    /// errors.
    async fn on_media_error(&self, message: String) {
        self.halt_selected(None).await;
        self.surface_error(PlayerError::Media(message)).await;
    }

    async fn on_track_ended(&self) {
        let (mode, current) = {
            let model = self.model.lock().await;
            if model.element_state == ElementState::Errored {
                tracing::debug!("Ignoring ended from an errored element");
                return;
            }
            (model.mode(), model.selected.clone())
        };
        let Some(current) = current else {
            return;
        };
        tracing::info!(mode = mode.as_str(), file_path = %current.file_path, "Track ended");
        let result = self.engine.stop_audio().await;
        crate::log_engine_result!("stop_audio", result);

        if mode == PlaybackMode::LoopSingle {
            tokio::time::sleep(self.config.loop_single_delay()).await;
            if !self.model.lock().await.is_selected(&current.file_path) {
                tracing::debug!("Selection changed during replay delay");
                return;
            }
            if let Err(e) = self.play_track(current).await {
                tracing::warn!(error = %e, "Replay failed");
            }
            return;
        }

        let next = self.model.lock().await.select_next(Direction::Next);
        match next {
            Some(track) => {
                if let Err(e) = self.play_track(track).await {
                    tracing::warn!(error = %e, "Auto-advance failed");
                }
            }
            None => self.finish_playlist().await,
        }
    }

    /// Sequence mode ran out of tracks. The engine is already stopped and the
    /// position is left where it ended.
    async fn finish_playlist(&self) {
        {
            let mut model = self.model.lock().await;
            model.pending_load = None;
            model.optimistic_playing = Some(Optimistic::new(false));
            let state = PlaybackState {
                is_playing: false,
                ..model.state().clone()
            };
            self.publish(&mut model, state);
        }
        tracing::info!("Reached the end of the playlist");
        self.emit(SyncEvent::PlaybackEnded);
    }
}
