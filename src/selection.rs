//! Track selection policy
//!
//! `select_next` is a pure decision over its inputs. The only state carried
//! between calls is the shuffle permutation, which `TrackSelector` owns and
//! regenerates only when shuffle is (re-)entered or the playlist's track set
//! changes.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{Direction, PlaybackMode, Track};

/// A permutation of a playlist, walked in order while in shuffle mode
#[derive(Clone, Debug, PartialEq)]
pub struct ShuffleOrder {
    tracks: Vec<Track>,
}

impl ShuffleOrder {
    pub fn generate(playlist: &[Track]) -> Self {
        Self::generate_with(playlist, &mut rand::rng())
    }

    /// Uniform Fisher-Yates over a copy of `playlist`.
    pub fn generate_with<R: Rng + ?Sized>(playlist: &[Track], rng: &mut R) -> Self {
        let mut tracks = playlist.to_vec();
        tracks.shuffle(rng);
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// True when this order holds exactly the multiset of identities in `playlist`.
    pub fn covers(&self, playlist: &[Track]) -> bool {
        self.tracks.len() == playlist.len() && identities(&self.tracks) == identities(playlist)
    }
}

fn identities(tracks: &[Track]) -> Vec<&str> {
    let mut ids: Vec<&str> = tracks.iter().map(Track::id).collect();
    ids.sort_unstable();
    ids
}

/// Whether a fresh shuffle permutation is needed.
pub fn should_regenerate(mode_entered: bool, order: Option<&ShuffleOrder>, playlist: &[Track]) -> bool {
    if mode_entered {
        return true;
    }
    match order {
        Some(order) => !order.covers(playlist),
        None => true,
    }
}

/// Chooses the track to play after `current` in `direction`.
///
/// In shuffle mode the effective list is `shuffle` when given, otherwise the
/// playlist order. Absence is the only failure signal.
pub fn select_next(
    current: Option<&Track>,
    playlist: &[Track],
    mode: PlaybackMode,
    direction: Direction,
    shuffle: Option<&ShuffleOrder>,
) -> Option<Track> {
    if playlist.is_empty() {
        return None;
    }

    let effective = match (mode, shuffle) {
        (PlaybackMode::Shuffle, Some(order)) if !order.is_empty() => order.tracks(),
        _ => playlist,
    };

    let Some(current) = current else {
        return effective.first().cloned();
    };

    if mode == PlaybackMode::LoopSingle {
        return Some(current.clone());
    }

    let Some(index) = effective.iter().position(|t| t.same_as(current)) else {
        return effective.first().cloned();
    };
    let len = effective.len();

    match mode {
        PlaybackMode::Sequence => match direction {
            Direction::Next => effective.get(index + 1).cloned(),
            Direction::Prev => index.checked_sub(1).and_then(|i| effective.get(i)).cloned(),
        },
        PlaybackMode::LoopList | PlaybackMode::Shuffle => {
            let target = match direction {
                Direction::Next => (index + 1) % len,
                Direction::Prev => (index + len - 1) % len,
            };
            effective.get(target).cloned()
        }
        PlaybackMode::LoopSingle => Some(current.clone()),
    }
}

/// Holds the playback mode and the shuffle permutation across calls
#[derive(Clone, Debug)]
pub struct TrackSelector {
    mode: PlaybackMode,
    shuffle: Option<ShuffleOrder>,
    regenerations: u64,
}

impl TrackSelector {
    pub fn new(mode: PlaybackMode, playlist: &[Track]) -> Self {
        let mut selector = Self {
            mode: PlaybackMode::Sequence,
            shuffle: None,
            regenerations: 0,
        };
        selector.set_mode(mode, playlist);
        selector
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn shuffle_order(&self) -> Option<&ShuffleOrder> {
        self.shuffle.as_ref()
    }

    /// Number of permutations generated so far.
    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }

    /// Returns true if the mode actually changed.
    pub fn set_mode(&mut self, mode: PlaybackMode, playlist: &[Track]) -> bool {
        if mode == self.mode && (mode != PlaybackMode::Shuffle || self.shuffle.is_some()) {
            return false;
        }
        let entered = mode == PlaybackMode::Shuffle;
        self.mode = mode;
        if entered {
            self.regenerate(true, playlist);
        } else {
            self.shuffle = None;
        }
        true
    }

    pub fn cycle_mode(&mut self, playlist: &[Track]) -> PlaybackMode {
        let next = self.mode.next();
        self.set_mode(next, playlist);
        next
    }

    /// Regenerates the permutation when the playlist's track set moved under it.
    pub fn sync_playlist(&mut self, playlist: &[Track]) -> bool {
        if self.mode != PlaybackMode::Shuffle {
            return false;
        }
        self.regenerate(false, playlist)
    }

    fn regenerate(&mut self, mode_entered: bool, playlist: &[Track]) -> bool {
        if !should_regenerate(mode_entered, self.shuffle.as_ref(), playlist) {
            return false;
        }
        self.shuffle = Some(ShuffleOrder::generate(playlist));
        self.regenerations += 1;
        tracing::debug!(tracks = playlist.len(), "Shuffle order regenerated");
        true
    }

    pub fn select(&mut self, current: Option<&Track>, playlist: &[Track], direction: Direction) -> Option<Track> {
        self.sync_playlist(playlist);
        select_next(current, playlist, self.mode, direction, self.shuffle.as_ref())
    }

    /// LoopSingle always continues; other modes continue while a next track exists.
    pub fn should_auto_play(&mut self, current: Option<&Track>, playlist: &[Track]) -> bool {
        self.mode == PlaybackMode::LoopSingle || self.select(current, playlist, Direction::Next).is_some()
    }
}

impl Default for TrackSelector {
    fn default() -> Self {
        Self::new(PlaybackMode::Sequence, &[])
    }
}
