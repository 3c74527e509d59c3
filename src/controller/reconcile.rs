//! Periodic engine polling
//!
//! The engine is authoritative for what it reports, except for values the
//! user just changed: those survive one disagreeing poll.

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::audio::ElementState;
use crate::model::{Optimistic, PlaybackState, SessionModel, Track, same_f64};

use super::{ERROR_TTL, PlaybackSynchronizer};

impl PlaybackSynchronizer {
    /// Polls the engine once and merges the answer into the published state.
    /// A failed poll leaves the state untouched.
    pub async fn reconcile(&self) {
        let remote = match self.engine.get_playback_state().await {
            Ok(state) => state,
            Err(e) => {
                tracing::debug!(error = %e, "Engine poll failed");
                return;
            }
        };
        let local_position = self.element.lock().await.current_time();

        let mut model = self.model.lock().await;
        let merged = merge(&mut model, remote, local_position);
        self.publish(&mut model, merged);
    }

    pub fn spawn_reconciler(&self) -> JoinHandle<()> {
        let controller = self.clone();
        let period = self.config.poll_interval();
        tracing::info!(period_ms = period.as_millis() as u64, "Starting engine reconciler");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                controller.reconcile().await;
                controller.model.lock().await.auto_clear_old_errors(ERROR_TTL);
            }
        })
    }
}

fn merge(model: &mut SessionModel, remote: PlaybackState, local_position: f64) -> PlaybackState {
    let is_playing = resolve(&mut model.optimistic_playing, remote.is_playing, |a, b| a == b);
    let volume = resolve(&mut model.optimistic_volume, remote.volume, same_f64);

    let pending = model.pending_load.as_ref().map(|p| p.file_path.clone());
    let selected = model.selected.as_ref().map(|t| t.file_path.clone());
    let current_track_id = match (pending, selected, remote.current_track_id) {
        (Some(pending), _, _) => Some(pending),
        (None, Some(selected), Some(engine)) if engine != selected => {
            tracing::warn!(engine = %engine, selected = %selected, "Engine reports a track that was not selected");
            Some(selected)
        }
        // Kept after a failed start or a finished playlist
        (None, Some(selected), _) => Some(selected),
        (None, None, Some(engine)) => {
            // Engine outlived a UI reload
            let track = model
                .playlist
                .iter()
                .find(|t| t.file_path == engine)
                .cloned()
                .unwrap_or_else(|| Track::from_path(engine.clone()));
            tracing::info!(file_path = %engine, "Adopted the engine's current track");
            model.selected = Some(track);
            Some(engine)
        }
        (None, None, None) => None,
    };

    let position = match model.element_state {
        ElementState::Playing | ElementState::Paused => local_position,
        _ => remote.position,
    };

    let duration = if remote.duration > 0.0 {
        remote.duration
    } else if current_track_id == model.state().current_track_id {
        model.state().duration
    } else {
        0.0
    };

    PlaybackState {
        is_playing,
        current_track_id,
        position,
        duration,
        volume,
    }
}

fn resolve<T: Copy + PartialEq>(slot: &mut Option<Optimistic<T>>, remote: T, same: fn(T, T) -> bool) -> T {
    let Some(pending) = slot.as_mut() else {
        return remote;
    };
    let (value, keep) = pending.resolve(remote, same);
    if !keep {
        *slot = None;
    }
    value
}
