//! Mutable session state owned by the playback synchronizer

use std::time::Instant;

use crate::audio::ElementState;
use crate::selection::TrackSelector;

use super::playback::{Optimistic, PlaybackState};
use super::types::{PlaybackMode, Track};

/// A `play_track` sequence waiting for `loadedmetadata`
#[derive(Clone, Debug, PartialEq)]
pub struct PendingLoad {
    pub file_path: String,
    pub source: String,
    /// 0 on the first load, 1 after the single reload
    pub attempt: u8,
}

impl PendingLoad {
    pub fn new(track: &Track, source: String) -> Self {
        Self {
            file_path: track.file_path.clone(),
            source,
            attempt: 0,
        }
    }
}

/// Everything the synchronizer knows between two awaits
pub struct SessionModel {
    pub playlist: Vec<Track>,
    pub selected: Option<Track>,
    pub selector: TrackSelector,
    pub pending_load: Option<PendingLoad>,
    pub element_state: ElementState,
    /// Source currently loaded into the element
    pub loaded_source: Option<String>,
    state: PlaybackState,
    pub optimistic_playing: Option<Optimistic<bool>>,
    pub optimistic_volume: Option<Optimistic<f64>>,
    pub muted_from: Option<f64>,
    pub reloads: u64,
    error_message: Option<String>,
    error_timestamp: Option<Instant>,
}

impl SessionModel {
    pub fn new(mode: PlaybackMode) -> Self {
        Self {
            playlist: Vec::new(),
            selected: None,
            selector: TrackSelector::new(mode, &[]),
            pending_load: None,
            element_state: ElementState::Idle,
            loaded_source: None,
            state: PlaybackState::default(),
            optimistic_playing: None,
            optimistic_volume: None,
            muted_from: None,
            reloads: 0,
            error_message: None,
            error_timestamp: None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Replaces the published snapshot. Returns true if it changed.
    pub fn commit(&mut self, state: PlaybackState) -> bool {
        if self.state == state {
            return false;
        }
        self.state = state;
        true
    }

    pub fn mode(&self) -> PlaybackMode {
        self.selector.mode()
    }

    pub fn is_selected(&self, file_path: &str) -> bool {
        self.selected.as_ref().is_some_and(|t| t.file_path == file_path)
    }

    /// True when `pending` is still the load the user is waiting for.
    pub fn is_pending(&self, source: &str) -> bool {
        self.pending_load
            .as_ref()
            .is_some_and(|p| p.source == source && self.is_selected(&p.file_path))
    }

    pub fn select_next(&mut self, direction: super::Direction) -> Option<Track> {
        let current = self.selected.clone();
        self.selector.select(current.as_ref(), &self.playlist, direction)
    }

    /// Back to the all-empty startup state, keeping playlist and mode.
    pub fn reset(&mut self) {
        let volume = self.state.volume;
        self.selected = None;
        self.pending_load = None;
        self.element_state = ElementState::Idle;
        self.loaded_source = None;
        self.optimistic_playing = None;
        self.optimistic_volume = None;
        self.state = PlaybackState {
            volume,
            ..PlaybackState::default()
        };
    }

    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
        self.error_timestamp = Some(Instant::now());
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
        self.error_timestamp = None;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Drops errors older than `max_age`.
    pub fn auto_clear_old_errors(&mut self, max_age: std::time::Duration) {
        if self.error_timestamp.is_some_and(|t| t.elapsed() >= max_age) {
            self.clear_error();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_requires_matching_selection() {
        let a = Track::from_path("/a.mp3");
        let b = Track::from_path("/b.mp3");
        let mut session = SessionModel::new(PlaybackMode::Sequence);

        session.selected = Some(a.clone());
        session.pending_load = Some(PendingLoad::new(&a, "asset://a".into()));
        assert!(session.is_pending("asset://a"));
        assert!(!session.is_pending("asset://b"));

        // The user skipped away while the load was in flight
        session.selected = Some(b);
        assert!(!session.is_pending("asset://a"));
    }

    #[test]
    fn test_reset_keeps_volume() {
        let mut session = SessionModel::new(PlaybackMode::Sequence);
        session.commit(PlaybackState {
            is_playing: true,
            current_track_id: Some("/a.mp3".into()),
            position: 12.0,
            duration: 30.0,
            volume: 0.3,
        });
        session.reset();
        assert_eq!(
            session.state(),
            &PlaybackState {
                volume: 0.3,
                ..PlaybackState::default()
            }
        );
    }

    #[test]
    fn test_commit_reports_changes_only() {
        let mut session = SessionModel::new(PlaybackMode::Sequence);
        assert!(!session.commit(PlaybackState::default()));
        assert!(session.commit(PlaybackState {
            position: 1.0,
            ..PlaybackState::default()
        }));
    }
}
