//! Media mode controller
//!
//! Arbitrates which playback subsystem (audio or video) may be driven. It
//! never touches media elements itself; the synchronizer pauses the outgoing
//! subsystem before asking for a switch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, broadcast};

use crate::model::{MediaType, MediaTypeState, PreferenceStore};

/// Notifications emitted by the controller
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MediaModeEvent {
    /// A user-visible switch; the transition animation starts.
    Switched { from: MediaType, to: MediaType },
    /// The settle delay elapsed.
    Settled(MediaType),
    /// Startup restoration from the store. Not a user transition.
    Restored(MediaType),
    Reset(MediaType),
}

#[derive(Clone)]
pub struct MediaModeController {
    state: Arc<RwLock<MediaTypeState>>,
    generation: Arc<AtomicU64>,
    store: PreferenceStore,
    settle_delay: Duration,
    events: broadcast::Sender<MediaModeEvent>,
}

impl MediaModeController {
    pub fn new(store: PreferenceStore, initial: MediaType, settle_delay: Duration) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            state: Arc::new(RwLock::new(MediaTypeState::new(initial))),
            generation: Arc::new(AtomicU64::new(0)),
            store,
            settle_delay,
            events,
        }
    }

    /// Creates the controller and applies any persisted preference.
    pub async fn restore(store: PreferenceStore, initial: MediaType, settle_delay: Duration) -> Self {
        let controller = Self::new(store, initial, settle_delay);
        controller.restore_persisted().await;
        controller
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MediaModeEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: MediaModeEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn persist(&self, state: &MediaTypeState) {
        self.store.set_media_type(state.current_type);
        self.store.set_media_type_state(state);
    }

    pub async fn state(&self) -> MediaTypeState {
        *self.state.read().await
    }

    pub async fn current(&self) -> MediaType {
        self.state.read().await.current_type
    }

    pub async fn is_active(&self, media_type: MediaType) -> bool {
        self.current().await == media_type
    }

    pub async fn is_transitioning(&self) -> bool {
        self.state.read().await.is_transitioning
    }

    /// Silent switch to the persisted type. No transition, no `Switched` event.
    async fn restore_persisted(&self) {
        let persisted = self
            .store
            .media_type()
            .or_else(|| self.store.media_type_state().map(|s| s.current_type));

        let Some(media_type) = persisted else {
            tracing::debug!("No persisted media type, keeping default");
            return;
        };

        let mut state = self.state.write().await;
        if state.current_type == media_type {
            return;
        }
        state.current_type = media_type;
        state.is_transitioning = false;
        state.last_switch_time = self
            .store
            .media_type_state()
            .map(|s| s.last_switch_time)
            .unwrap_or(0);
        let snapshot = *state;
        drop(state);

        self.persist(&snapshot);
        tracing::info!(media_type = media_type.as_str(), "Media type restored");
        self.emit(MediaModeEvent::Restored(media_type));
    }

    /// Returns false when `media_type` is already current.
    pub async fn switch_to(&self, media_type: MediaType) -> bool {
        let mut state = self.state.write().await;
        if state.current_type == media_type {
            return false;
        }

        let from = state.current_type;
        state.current_type = media_type;
        state.is_transitioning = true;
        state.last_switch_time = chrono::Utc::now().timestamp_millis();
        let snapshot = *state;
        drop(state);

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.persist(&snapshot);
        tracing::info!(from = from.as_str(), to = media_type.as_str(), "Media type switched");
        self.emit(MediaModeEvent::Switched { from, to: media_type });

        let controller = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(controller.settle_delay).await;
            controller.settle(generation).await;
        });
        true
    }

    async fn settle(&self, generation: u64) {
        // A newer switch owns the flag now
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        let mut state = self.state.write().await;
        state.is_transitioning = false;
        let snapshot = *state;
        drop(state);

        self.persist(&snapshot);
        self.emit(MediaModeEvent::Settled(snapshot.current_type));
    }

    pub async fn toggle(&self) -> MediaType {
        let target = self.current().await.other();
        self.switch_to(target).await;
        target
    }

    pub async fn set_transitioning(&self, transitioning: bool) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        state.is_transitioning = transitioning;
        let snapshot = *state;
        drop(state);
        self.persist(&snapshot);
    }

    /// Back to the initial state with `media_type` (audio when `None`).
    pub async fn reset(&self, media_type: Option<MediaType>) {
        let media_type = media_type.unwrap_or_default();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let snapshot = MediaTypeState::new(media_type);
        *self.state.write().await = snapshot;
        self.persist(&snapshot);
        self.emit(MediaModeEvent::Reset(media_type));
    }
}
