//! playsync - keeps a local media element and an out-of-process audio
//! engine agreeing on one playback state.
//!
//! - `model`: tracks, modes, state snapshots, the engine seam, persistence
//! - `selection`: next-track policy and shuffle order
//! - `audio`: the local media element and its event stream
//! - `media_mode`: audio/video exclusivity
//! - `controller`: the playback synchronizer

pub mod audio;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod media_mode;
pub mod model;
pub mod selection;

pub use audio::{ElementState, HeadlessElement, MediaElement, MediaEvent};
pub use collaborators::{AssetResolver, LogNotifier, SourceResolver, TrackNotifier};
pub use config::SyncConfig;
pub use controller::{PlaybackSynchronizer, SyncEvent};
pub use error::{PlayerError, Result};
pub use media_mode::{MediaModeController, MediaModeEvent};
pub use model::{
    AudioEngine, Direction, LocalEngine, MediaType, PlaybackMode, PlaybackState, PreferenceStore,
    Track,
};
pub use selection::{ShuffleOrder, TrackSelector, select_next};
