//! Controller module - the playback state synchronizer
//!
//! Reconciles the local media element and the remote audio engine into one
//! `PlaybackState`. It is organized into submodules by responsibility:
//!
//! - `playback`: user commands (play, toggle, seek, volume, skip)
//! - `player_events`: media element event handling, end-of-track policy
//! - `reconcile`: periodic engine polling
//! - `media_type`: pausing the outgoing subsystem on media type switches
//!
//! User commands are not queued against each other. Two commands racing
//! resolve as "last command wins" and the next reconciliation tick corrects
//! any transient inconsistency.
//!
//! Lock order: `element` before `model`, never the reverse.

mod playback;
mod player_events;
mod reconcile;
mod media_type;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};

use crate::audio::{ElementState, MediaElement};
use crate::collaborators::{AssetResolver, LogNotifier, SourceResolver, TrackNotifier};
use crate::config::SyncConfig;
use crate::error::{PlayerError, Result};
use crate::media_mode::MediaModeController;
use crate::model::{
    MediaType, PlaybackMode, PlaybackModeInfo, PlaybackState, PreferenceStore, SessionModel, Track,
    TrackNotification,
};

/// How long a surfaced error stays in `last_error`
const ERROR_TTL: Duration = Duration::from_secs(5);

/// Notifications for the surrounding UI
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    StateChanged(PlaybackState),
    TrackStarted(Track),
    /// Sequence mode ran past the last track
    PlaybackEnded,
    Error(PlayerError),
}

#[derive(Clone)]
pub struct PlaybackSynchronizer {
    pub(crate) model: Arc<Mutex<SessionModel>>,
    pub(crate) element: Arc<Mutex<Box<dyn MediaElement>>>,
    engine: Arc<dyn crate::model::AudioEngine>,
    media_mode: MediaModeController,
    store: PreferenceStore,
    resolver: Arc<dyn SourceResolver>,
    notifier: Arc<dyn TrackNotifier>,
    events: broadcast::Sender<SyncEvent>,
    config: SyncConfig,
    subsystem: MediaType,
}

impl PlaybackSynchronizer {
    /// Builds a synchronizer for the audio subsystem. The playback mode is
    /// restored from `store`.
    pub fn new(
        engine: Arc<dyn crate::model::AudioEngine>,
        element: Box<dyn MediaElement>,
        media_mode: MediaModeController,
        store: PreferenceStore,
        config: SyncConfig,
    ) -> Self {
        let mode = store.playback_mode();
        tracing::debug!(mode = mode.as_str(), "Restored playback mode");
        let (events, _) = broadcast::channel(256);

        Self {
            model: Arc::new(Mutex::new(SessionModel::new(mode))),
            element: Arc::new(Mutex::new(element)),
            engine,
            media_mode,
            store,
            resolver: Arc::new(AssetResolver),
            notifier: Arc::new(LogNotifier),
            events,
            config,
            subsystem: MediaType::Audio,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SourceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn TrackNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Which subsystem this synchronizer drives.
    pub fn with_subsystem(mut self, subsystem: MediaType) -> Self {
        self.subsystem = subsystem;
        self
    }

    pub fn subsystem(&self) -> MediaType {
        self.subsystem
    }

    pub fn media_mode(&self) -> &MediaModeController {
        &self.media_mode
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> PlaybackState {
        self.model.lock().await.state().clone()
    }

    pub async fn selected_track(&self) -> Option<Track> {
        self.model.lock().await.selected.clone()
    }

    pub async fn playlist(&self) -> Vec<Track> {
        self.model.lock().await.playlist.clone()
    }

    pub async fn playback_mode(&self) -> PlaybackMode {
        self.model.lock().await.mode()
    }

    pub async fn playback_mode_info(&self) -> PlaybackModeInfo {
        self.playback_mode().await.info()
    }

    /// Whether the end of the selected track leads to more playback.
    pub async fn should_auto_play(&self) -> bool {
        let mut model = self.model.lock().await;
        let model = &mut *model;
        model.selector.should_auto_play(model.selected.as_ref(), &model.playlist)
    }

    pub async fn element_state(&self) -> ElementState {
        self.model.lock().await.element_state
    }

    /// Number of from-scratch reloads done to recover a failed start.
    pub async fn reload_count(&self) -> u64 {
        self.model.lock().await.reloads
    }

    pub async fn last_error(&self) -> Option<String> {
        self.model.lock().await.last_error().map(str::to_string)
    }

    /// Initial engine poll; call once at startup.
    pub async fn initialize(&self) {
        self.reconcile().await;
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Commits a new snapshot and notifies subscribers if it changed.
    fn publish(&self, model: &mut SessionModel, state: PlaybackState) {
        if model.commit(state) {
            self.emit(SyncEvent::StateChanged(model.state().clone()));
        }
    }

    fn source_for(&self, track: &Track) -> String {
        self.resolver.to_playable_source(&track.file_path)
    }

    /// Errors if another subsystem currently owns playback.
    async fn ensure_active(&self) -> Result<()> {
        if self.media_mode.is_active(self.subsystem).await {
            return Ok(());
        }
        let error = PlayerError::SubsystemInactive(self.subsystem);
        tracing::warn!(subsystem = self.subsystem.as_str(), "Play command rejected");
        Err(error)
    }

    /// Must not be called with `model` locked.
    async fn surface_error(&self, error: PlayerError) {
        tracing::error!(error = %error, "Playback error");
        self.model.lock().await.set_error(error.user_message());
        self.emit(SyncEvent::Error(error));
    }

    /// Fire-and-forget; never blocks playback.
    fn notify_started(&self, track: &Track) {
        let notifier = self.notifier.clone();
        let notification = TrackNotification::from(track);
        tokio::spawn(async move {
            if let Err(e) = notifier.track_started(&notification).await {
                tracing::warn!(error = %e, file_path = %notification.file_path, "Track notification failed");
            }
        });
    }
}
