//! Local, in-process media element
//!
//! The element is driven through `MediaElement` and reports back through
//! `MediaEvent`s on a channel. `ElementState` is the explicit state machine the
//! synchronizer keeps for it, so nothing depends on callback ordering.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Native events of a media element. Each names the source it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaEvent {
    LoadedMetadata { source: String, duration: f64 },
    TimeUpdate { source: String, position: f64 },
    Ended { source: String },
    Play { source: String },
    Pause { source: String },
    Error { source: String, message: String },
}

impl MediaEvent {
    pub fn source(&self) -> &str {
        match self {
            MediaEvent::LoadedMetadata { source, .. }
            | MediaEvent::TimeUpdate { source, .. }
            | MediaEvent::Ended { source }
            | MediaEvent::Play { source }
            | MediaEvent::Pause { source }
            | MediaEvent::Error { source, .. } => source,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MediaEvent::LoadedMetadata { .. } => "loadedmetadata",
            MediaEvent::TimeUpdate { .. } => "timeupdate",
            MediaEvent::Ended { .. } => "ended",
            MediaEvent::Play { .. } => "play",
            MediaEvent::Pause { .. } => "pause",
            MediaEvent::Error { .. } => "error",
        }
    }
}

/// Lifecycle of the local element as seen by the synchronizer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ElementState {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Errored,
}

impl ElementState {
    /// Transition on a native event.
    pub fn on_event(self, event: &MediaEvent) -> Self {
        match (self, event) {
            (_, MediaEvent::Error { .. }) => ElementState::Errored,
            (ElementState::Errored, _) => ElementState::Errored,
            (ElementState::Loading, MediaEvent::LoadedMetadata { .. }) => ElementState::Ready,
            (_, MediaEvent::Play { .. }) => ElementState::Playing,
            (ElementState::Playing, MediaEvent::Pause { .. }) => ElementState::Paused,
            (ElementState::Playing, MediaEvent::Ended { .. }) => ElementState::Paused,
            (state, _) => state,
        }
    }

    pub fn on_load(self) -> Self {
        ElementState::Loading
    }

    pub fn on_play_resolved(self) -> Self {
        ElementState::Playing
    }

    pub fn on_pause(self) -> Self {
        match self {
            ElementState::Playing | ElementState::Ready => ElementState::Paused,
            state => state,
        }
    }

    pub fn is_playing(self) -> bool {
        self == ElementState::Playing
    }
}

/// Control surface of a local media element
#[async_trait]
pub trait MediaElement: Send {
    /// Replaces the source and starts loading it from scratch.
    fn load(&mut self, source: &str);
    fn source(&self) -> Option<&str>;
    /// May reject, e.g. on autoplay restrictions or decode failure.
    async fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn set_current_time(&mut self, seconds: f64);
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
}

const HEADLESS_TICK: Duration = Duration::from_millis(250);

/// Timer-driven element without real output.
///
/// Every loaded source lasts `track_length` seconds; position advances on a
/// ticker while playing.
pub struct HeadlessElement {
    events: mpsc::UnboundedSender<MediaEvent>,
    source: Option<String>,
    track_length: f64,
    position: Arc<Mutex<f64>>,
    volume: f64,
    ticker: Option<JoinHandle<()>>,
}

impl HeadlessElement {
    pub fn new(events: mpsc::UnboundedSender<MediaEvent>, track_length: f64) -> Self {
        Self {
            events,
            source: None,
            track_length,
            position: Arc::new(Mutex::new(0.0)),
            volume: 1.0,
            ticker: None,
        }
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn emit(&self, event: MediaEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("Media event dropped, listener gone");
        }
    }

    fn set_position(&self, seconds: f64) {
        if let Ok(mut position) = self.position.lock() {
            *position = seconds;
        }
    }
}

#[async_trait]
impl MediaElement for HeadlessElement {
    fn load(&mut self, source: &str) {
        self.stop_ticker();
        self.source = Some(source.to_string());
        self.set_position(0.0);
        self.emit(MediaEvent::LoadedMetadata {
            source: source.to_string(),
            duration: self.track_length,
        });
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    async fn play(&mut self) -> Result<()> {
        let Some(source) = self.source.clone() else {
            return Err(anyhow::anyhow!("no source loaded"));
        };
        if self.ticker.as_ref().is_some_and(|t| !t.is_finished()) {
            return Ok(());
        }
        if self.current_time() >= self.track_length {
            self.set_position(0.0);
        }

        let events = self.events.clone();
        let position = self.position.clone();
        let length = self.track_length;
        let tick_source = source.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEADLESS_TICK);
            interval.tick().await;
            loop {
                interval.tick().await;
                let now = match position.lock() {
                    Ok(mut p) => {
                        *p = (*p + HEADLESS_TICK.as_secs_f64()).min(length);
                        *p
                    }
                    Err(_) => break,
                };
                let _ = events.send(MediaEvent::TimeUpdate {
                    source: tick_source.clone(),
                    position: now,
                });
                if now >= length {
                    let _ = events.send(MediaEvent::Ended { source: tick_source });
                    break;
                }
            }
        }));

        self.emit(MediaEvent::Play { source });
        Ok(())
    }

    fn pause(&mut self) {
        self.stop_ticker();
        if let Some(source) = self.source.clone() {
            self.emit(MediaEvent::Pause { source });
        }
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.set_position(seconds.clamp(0.0, self.track_length));
    }

    fn current_time(&self) -> f64 {
        self.position.lock().map(|p| *p).unwrap_or(0.0)
    }

    fn duration(&self) -> f64 {
        if self.source.is_some() { self.track_length } else { 0.0 }
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}

impl Drop for HeadlessElement {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
