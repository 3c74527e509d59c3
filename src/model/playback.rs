//! Playback-related state snapshots

use serde::{Deserialize, Serialize};

use super::types::{MediaType, Track};

/// Authoritative playback snapshot exposed to the UI.
///
/// Rebuilt by the synchronizer on every reconciliation, never patched from
/// two places at once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    #[serde(rename = "current_track")]
    pub current_track_id: Option<String>,
    /// Seconds
    pub position: f64,
    /// Seconds
    pub duration: f64,
    /// `0.0..=1.0`
    pub volume: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_track_id: None,
            position: 0.0,
            duration: 0.0,
            volume: 1.0,
        }
    }
}

impl PlaybackState {
    pub fn is_current(&self, track: &Track) -> bool {
        self.current_track_id.as_deref() == Some(track.id())
    }
}

/// Media mode controller state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaTypeState {
    pub current_type: MediaType,
    pub is_transitioning: bool,
    /// Milliseconds since the Unix epoch, `0` if never switched.
    pub last_switch_time: i64,
}

impl MediaTypeState {
    pub fn new(current_type: MediaType) -> Self {
        Self {
            current_type,
            is_transitioning: false,
            last_switch_time: 0,
        }
    }
}

impl Default for MediaTypeState {
    fn default() -> Self {
        Self::new(MediaType::Audio)
    }
}

/// Payload of the fire-and-forget "track started" notification
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackNotification {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub file_path: String,
}

impl From<&Track> for TrackNotification {
    fn from(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            file_path: track.file_path.clone(),
        }
    }
}

/// A locally applied value waiting for the engine to confirm it.
///
/// Survives at most `stale_polls` reconciliations that disagree with it;
/// after that the engine's value wins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Optimistic<T> {
    pub value: T,
    stale_polls: u8,
}

impl<T: Copy + PartialEq> Optimistic<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            stale_polls: 1,
        }
    }

    /// Resolves against the engine's report. Returns the value to publish and
    /// whether the optimistic entry should be kept.
    pub fn resolve(&mut self, remote: T, same: impl Fn(T, T) -> bool) -> (T, bool) {
        if same(self.value, remote) {
            return (remote, false);
        }
        if self.stale_polls > 0 {
            self.stale_polls -= 1;
            return (self.value, true);
        }
        (remote, false)
    }
}

pub(crate) fn same_f64(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimistic_tolerates_one_stale_poll() {
        let mut pending = Optimistic::new(0.4);

        // First disagreeing poll keeps the local value
        assert_eq!(pending.resolve(1.0, same_f64), (0.4, true));
        // Second one hands authority back to the engine
        assert_eq!(pending.resolve(1.0, same_f64), (1.0, false));
    }

    #[test]
    fn test_optimistic_confirmed_immediately() {
        let mut pending = Optimistic::new(true);
        assert_eq!(pending.resolve(true, |a, b| a == b), (true, false));
    }

    #[test]
    fn test_playback_state_wire_names() {
        let json = serde_json::to_value(PlaybackState::default()).unwrap();
        assert_eq!(json["current_track"], serde_json::Value::Null);
        assert_eq!(json["volume"], 1.0);
    }
}
