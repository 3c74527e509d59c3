//! Playback control methods

use crate::audio::MediaElement;
use crate::error::{PlayerError, Result};
use crate::model::{Direction, Optimistic, PendingLoad, PlaybackMode, PlaybackState, Track};

use super::{PlaybackSynchronizer, SyncEvent};

impl PlaybackSynchronizer {
    /// Loads `track` into the element. The engine is told once
    /// `loadedmetadata` arrives for this exact source.
    pub async fn play_track(&self, track: Track) -> Result<()> {
        self.ensure_active().await?;
        let source = self.source_for(&track);
        tracing::info!(file_path = %track.file_path, source = %source, "Loading track");

        // Holding the element across the model update keeps the loaded source
        // and the pending load in agreement when two plays race.
        let mut element = self.element.lock().await;
        {
            let mut model = self.model.lock().await;
            model.selected = Some(track.clone());
            model.pending_load = Some(PendingLoad::new(&track, source.clone()));
            model.element_state = model.element_state.on_load();
            model.loaded_source = Some(source.clone());
            model.clear_error();
        }
        element.load(&source);
        Ok(())
    }

    /// Continues a `play_track` after `loadedmetadata` for `source`.
    pub(crate) async fn start_loaded_track(&self, source: &str, duration: f64) {
        let (pending, track) = {
            let model = self.model.lock().await;
            if !model.is_pending(source) {
                tracing::debug!(source, "Ignoring metadata for a load nobody waits for");
                return;
            }
            match (model.pending_load.clone(), model.selected.clone()) {
                (Some(pending), Some(track)) => (pending, track),
                _ => return,
            }
        };

        let outcome = self.start_engine_and_element(&pending, duration).await;

        match outcome {
            Ok(false) => {
                tracing::debug!(file_path = %pending.file_path, "Start superseded before local play");
            }
            Ok(true) => {
                {
                    let mut model = self.model.lock().await;
                    if !model.is_pending(source) {
                        tracing::debug!(file_path = %pending.file_path, "Selection changed while starting");
                        return;
                    }
                    model.pending_load = None;
                    model.element_state = model.element_state.on_play_resolved();
                    model.optimistic_playing = Some(Optimistic::new(true));
                    let state = PlaybackState {
                        is_playing: true,
                        current_track_id: Some(track.file_path.clone()),
                        position: 0.0,
                        duration,
                        volume: model.state().volume,
                    };
                    self.publish(&mut model, state);
                }
                tracing::info!(file_path = %track.file_path, duration, "Track started");
                self.emit(SyncEvent::TrackStarted(track.clone()));
                self.notify_started(&track);
            }
            Err(e) if pending.attempt == 0 => {
                tracing::warn!(error = %e, file_path = %pending.file_path, "Start failed, reloading once");
                let mut element = self.element.lock().await;
                {
                    let mut model = self.model.lock().await;
                    if !model.is_pending(source) {
                        return;
                    }
                    if let Some(pending) = model.pending_load.as_mut() {
                        pending.attempt = 1;
                    }
                    model.reloads += 1;
                    model.element_state = model.element_state.on_load();
                }
                element.load(source);
            }
            Err(e) => {
                if !self.halt_selected(Some(source)).await {
                    return;
                }
                self.surface_error(PlayerError::PlaybackFailed {
                    file_path: pending.file_path,
                    message: e.to_string(),
                })
                .await;
            }
        }
    }

    /// playAudio, rewind, updateDuration, then local play. Returns false
    /// without playing locally when the load stopped being pending while the
    /// engine was starting.
    async fn start_engine_and_element(&self, pending: &PendingLoad, duration: f64) -> Result<bool> {
        self.engine
            .play_audio(&pending.file_path)
            .await
            .map_err(|e| PlayerError::engine("play_audio", &e))?;
        let result = self.engine.seek_to(0.0).await;
        crate::log_engine_result!("seek_to", result);
        self.engine
            .update_duration(duration)
            .await
            .map_err(|e| PlayerError::engine("update_duration", &e))?;

        let mut element = self.element.lock().await;
        let superseded = {
            let model = self.model.lock().await;
            if model.is_pending(&pending.source) {
                None
            } else {
                // Another load owns the engine now unless nothing is pending
                Some(model.pending_load.is_none())
            }
        };
        if let Some(nothing_pending) = superseded {
            drop(element);
            if nothing_pending {
                let result = self.engine.stop_audio().await;
                crate::log_engine_result!("stop_audio", result);
            }
            return Ok(false);
        }
        element
            .play()
            .await
            .map_err(|e| PlayerError::Media(e.to_string()))?;
        Ok(true)
    }

    /// Leaves the selected track paused on both sides after a failure. With
    /// `source` set, does nothing and returns false unless that load is still
    /// pending.
    pub(crate) async fn halt_selected(&self, source: Option<&str>) -> bool {
        {
            let mut element = self.element.lock().await;
            let mut model = self.model.lock().await;
            if source.is_some_and(|source| !model.is_pending(source)) {
                return false;
            }
            element.pause();
            model.pending_load = None;
            model.element_state = model.element_state.on_pause();
            model.optimistic_playing = Some(Optimistic::new(false));
            let state = PlaybackState {
                is_playing: false,
                current_track_id: model.selected.as_ref().map(|t| t.file_path.clone()),
                ..model.state().clone()
            };
            self.publish(&mut model, state);
        }
        let result = self.engine.pause_audio().await;
        crate::log_engine_result!("pause_audio", result);
        true
    }

    /// Pauses when playing, resumes the selected track otherwise. Without a
    /// selected track this does nothing.
    pub async fn toggle_playback(&self) -> Result<()> {
        let (selected, is_playing) = {
            let model = self.model.lock().await;
            (model.selected.clone(), model.state().is_playing)
        };
        tracing::debug!(is_playing, "Toggling playback");

        match selected {
            None => {
                tracing::debug!("Nothing selected, toggle ignored");
                Ok(())
            }
            Some(_) if is_playing => self.pause().await,
            Some(track) => self.resume_track(track).await,
        }
    }

    pub async fn resume(&self) -> Result<()> {
        let (selected, is_playing) = {
            let model = self.model.lock().await;
            (model.selected.clone(), model.state().is_playing)
        };
        match selected {
            None => Err(PlayerError::NoTrackSelected),
            Some(_) if is_playing => Ok(()),
            Some(track) => self.resume_track(track).await,
        }
    }

    pub async fn pause(&self) -> Result<()> {
        {
            let mut element = self.element.lock().await;
            element.pause();
            let mut model = self.model.lock().await;
            model.pending_load = None;
            model.element_state = model.element_state.on_pause();
            model.optimistic_playing = Some(Optimistic::new(false));
            let state = PlaybackState {
                is_playing: false,
                ..model.state().clone()
            };
            self.publish(&mut model, state);
        }

        let result = self.engine.pause_audio().await;
        crate::log_engine_result!("pause_audio", result);
        self.reconcile().await;
        tracing::info!("Playback paused");
        Ok(())
    }

    async fn resume_track(&self, track: Track) -> Result<()> {
        self.ensure_active().await?;
        let source = self.source_for(&track);

        let local = {
            let mut element = self.element.lock().await;
            {
                let mut model = self.model.lock().await;
                model.pending_load = None;
                if element.source() != Some(source.as_str()) {
                    tracing::debug!(source = %source, "Element lost its source, loading again");
                    model.element_state = model.element_state.on_load();
                    model.loaded_source = Some(source.clone());
                    drop(model);
                    element.load(&source);
                }
            }
            self.play_with_reload(&mut **element, &source).await
        };

        if let Err(e) = local {
            {
                let mut model = self.model.lock().await;
                model.element_state = model.element_state.on_pause();
                model.optimistic_playing = Some(Optimistic::new(false));
                let state = PlaybackState {
                    is_playing: false,
                    ..model.state().clone()
                };
                self.publish(&mut model, state);
            }
            let error = PlayerError::PlaybackFailed {
                file_path: track.file_path.clone(),
                message: e.to_string(),
            };
            self.surface_error(error.clone()).await;
            return Err(error);
        }

        let engine_has_track = {
            let mut model = self.model.lock().await;
            model.element_state = model.element_state.on_play_resolved();
            model.optimistic_playing = Some(Optimistic::new(true));
            let engine_has_track = model.state().is_current(&track);
            let state = PlaybackState {
                is_playing: true,
                current_track_id: Some(track.file_path.clone()),
                ..model.state().clone()
            };
            self.publish(&mut model, state);
            engine_has_track
        };

        let engine_result = if engine_has_track {
            self.engine.resume_audio().await
        } else {
            let duration = self.element.lock().await.duration();
            match self.engine.play_audio(&track.file_path).await {
                Ok(()) => self.engine.update_duration(duration).await,
                Err(e) => Err(e),
            }
        };
        if let Err(e) = engine_result {
            tracing::warn!(error = %e, file_path = %track.file_path, "Engine did not follow resume");
        }

        tracing::info!(file_path = %track.file_path, "Playback resumed");
        self.reconcile().await;
        Ok(())
    }

    /// One local play; on rejection, one reload from scratch and one more try.
    async fn play_with_reload(&self, element: &mut dyn MediaElement, source: &str) -> Result<()> {
        let Err(first) = element.play().await else {
            return Ok(());
        };
        tracing::warn!(error = %first, source, "Local play rejected, reloading once");
        {
            let mut model = self.model.lock().await;
            model.reloads += 1;
            model.element_state = model.element_state.on_load();
        }
        element.load(source);
        element
            .play()
            .await
            .map_err(|e| PlayerError::Media(e.to_string()))
    }

    /// Pauses and rewinds. The selection is kept.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut element = self.element.lock().await;
            element.pause();
            element.set_current_time(0.0);
            let mut model = self.model.lock().await;
            model.pending_load = None;
            model.element_state = model.element_state.on_pause();
            model.optimistic_playing = Some(Optimistic::new(false));
            let state = PlaybackState {
                is_playing: false,
                position: 0.0,
                ..model.state().clone()
            };
            self.publish(&mut model, state);
        }
        let result = self.engine.stop_audio().await;
        crate::log_engine_result!("stop_audio", result);
        self.reconcile().await;
        tracing::info!("Playback stopped");
        Ok(())
    }

    /// Seeks locally first, then forwards to the engine. Engine failures are
    /// only logged.
    pub async fn seek_to(&self, position: f64) {
        if position.is_nan() {
            return;
        }
        let target = {
            let mut element = self.element.lock().await;
            let duration = element.duration();
            let upper = if duration > 0.0 { duration } else { f64::MAX };
            let target = position.clamp(0.0, upper);
            element.set_current_time(target);

            let mut model = self.model.lock().await;
            let state = PlaybackState {
                position: target,
                ..model.state().clone()
            };
            self.publish(&mut model, state);
            target
        };

        tracing::debug!(position = target, "Seeking");
        if let Err(e) = self.engine.seek_to(target).await {
            tracing::warn!(error = %e, position = target, "Engine seek failed");
        }
    }

    /// Relative seek, negative goes back.
    pub async fn skip(&self, seconds: f64) {
        let current = self.element.lock().await.current_time();
        self.seek_to(current + seconds).await;
    }

    pub async fn set_volume(&self, volume: f64) {
        self.model.lock().await.muted_from = None;
        self.apply_volume(volume).await;
    }

    /// Returns true when now muted. Unmuting restores the previous volume.
    pub async fn toggle_mute(&self) -> bool {
        let (muted_from, current) = {
            let model = self.model.lock().await;
            (model.muted_from, model.state().volume)
        };
        match muted_from {
            Some(previous) => {
                self.model.lock().await.muted_from = None;
                self.apply_volume(previous).await;
                tracing::debug!(volume = previous, "Unmuted");
                false
            }
            None => {
                self.model.lock().await.muted_from = Some(current);
                self.apply_volume(0.0).await;
                tracing::debug!(restore_to = current, "Muted");
                true
            }
        }
    }

    async fn apply_volume(&self, volume: f64) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        {
            let mut element = self.element.lock().await;
            element.set_volume(volume);
            let mut model = self.model.lock().await;
            model.optimistic_volume = Some(Optimistic::new(volume));
            let state = PlaybackState {
                volume,
                ..model.state().clone()
            };
            self.publish(&mut model, state);
        }
        if let Err(e) = self.engine.set_volume(volume).await {
            tracing::warn!(error = %e, volume, "Engine volume update failed");
        }
    }

    pub async fn next_track(&self) -> Result<Option<Track>> {
        self.advance(Direction::Next).await
    }

    pub async fn previous_track(&self) -> Result<Option<Track>> {
        self.advance(Direction::Prev).await
    }

    async fn advance(&self, direction: Direction) -> Result<Option<Track>> {
        let next = self.model.lock().await.select_next(direction);
        let Some(track) = next else {
            tracing::debug!(?direction, "No track in that direction");
            return Ok(None);
        };
        self.play_track(track.clone()).await?;
        Ok(Some(track))
    }

    /// Reacts to a selection made elsewhere. Re-selecting the current track
    /// does nothing; `None` clears the session.
    pub async fn select_track(&self, track: Option<Track>) -> Result<()> {
        let Some(track) = track else {
            self.clear().await;
            return Ok(());
        };

        {
            let mut model = self.model.lock().await;
            if model.is_selected(&track.file_path) {
                return Ok(());
            }
            if model.state().is_current(&track) {
                tracing::debug!(file_path = %track.file_path, "Engine already has this track");
                model.selected = Some(track);
                return Ok(());
            }
        }
        self.play_track(track).await
    }

    pub async fn set_playlist(&self, playlist: Vec<Track>) {
        let mut model = self.model.lock().await;
        model.playlist = playlist;
        let model = &mut *model;
        let regenerated = model.selector.sync_playlist(&model.playlist);
        tracing::debug!(tracks = model.playlist.len(), regenerated, "Playlist updated");
    }

    /// Returns false when `mode` was already active.
    pub async fn set_playback_mode(&self, mode: PlaybackMode) -> bool {
        let changed = {
            let mut model = self.model.lock().await;
            let model = &mut *model;
            model.selector.set_mode(mode, &model.playlist)
        };
        if changed {
            self.store.set_playback_mode(mode);
            tracing::info!(mode = mode.as_str(), "Playback mode changed");
        }
        changed
    }

    pub async fn cycle_playback_mode(&self) -> PlaybackMode {
        let mode = {
            let mut model = self.model.lock().await;
            let model = &mut *model;
            model.selector.cycle_mode(&model.playlist)
        };
        self.store.set_playback_mode(mode);
        tracing::info!(mode = mode.as_str(), "Playback mode cycled");
        mode
    }

    /// Stops everything and forgets the selection.
    pub async fn clear(&self) {
        // Engine first so a poll in between cannot adopt its old track
        let result = self.engine.stop_audio().await;
        crate::log_engine_result!("stop_audio", result);
        let mut element = self.element.lock().await;
        element.pause();
        let mut model = self.model.lock().await;
        model.reset();
        self.emit(SyncEvent::StateChanged(model.state().clone()));
        tracing::info!("Playback cleared");
    }
}
