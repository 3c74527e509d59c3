//! Model module - Data types and state shared by the playback components
//!
//! - `types`: tracks, playback modes, media types
//! - `playback`: playback and media-mode state snapshots
//! - `engine`: the audio engine command surface
//! - `store`: key/value persistence of preferences
//! - `session`: the synchronizer's mutable session state

mod types;
mod playback;
mod engine;
mod store;
mod session;

pub use types::{
    Direction, MediaType, MediaTypeInfo, PlaybackMode, PlaybackModeInfo, Track,
};

pub use playback::{MediaTypeState, Optimistic, PlaybackState, TrackNotification};
pub(crate) use playback::same_f64;

pub use engine::{AudioEngine, LocalEngine};

pub use store::{
    JsonFileStore, KeyValueStore, MemoryStore, PersistedMediaTypeState, PlaybackPreferences,
    PreferenceStore, MEDIA_TYPE_KEY, MEDIA_TYPE_STATE_KEY, PLAYBACK_MODE_KEY,
    PLAYBACK_PREFERENCES_KEY,
};

pub use session::{PendingLoad, SessionModel};
