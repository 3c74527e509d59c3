//! Test doubles for the synchronizer's two playback sides
//!
//! - `ScriptedEngine`: wraps `LocalEngine`, records commands, fails or stalls
//!   on demand
//! - `FakeElement`: queues events instead of ticking; tests pump them by hand

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::mpsc;

use playsync::{
    AudioEngine, LocalEngine, MediaElement, MediaEvent, MediaModeController, MediaType, PlaybackMode,
    PlaybackState, PlaybackSynchronizer, PreferenceStore, SyncConfig, SyncEvent, Track,
};

pub const TRACK_SECONDS: f64 = 30.0;

pub fn tracks() -> Vec<Track> {
    vec![
        Track::new("First", "Artist", "Album", TRACK_SECONDS, "/music/a.mp3"),
        Track::new("Second", "Artist", "Album", TRACK_SECONDS, "/music/b.mp3"),
        Track::new("Third", "Artist", "Album", TRACK_SECONDS, "/music/c.mp3"),
    ]
}

/// Engine double with failure injection
#[derive(Default)]
pub struct ScriptedEngine {
    inner: LocalEngine,
    calls: Mutex<Vec<String>>,
    play_failures: AtomicU32,
    rejected: Mutex<Vec<&'static str>>,
    play_delay: Mutex<Option<Duration>>,
}

impl ScriptedEngine {
    /// The next `count` play_audio calls are rejected.
    pub fn fail_next_plays(&self, count: u32) {
        self.play_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_volume(&self, fail: bool) {
        if fail {
            self.reject("set_volume");
        } else {
            self.rejected.lock().unwrap().retain(|c| *c != "set_volume");
        }
    }

    /// Every later `command` call is recorded, then rejected without
    /// reaching the inner engine.
    pub fn reject(&self, command: &'static str) {
        self.rejected.lock().unwrap().push(command);
    }

    /// Every later play_audio call takes `delay` before the engine starts.
    pub fn delay_plays(&self, delay: Duration) {
        *self.play_delay.lock().unwrap() = Some(delay);
    }

    fn check(&self, command: &str) -> Result<()> {
        if self.rejected.lock().unwrap().iter().any(|c| *c == command) {
            return Err(anyhow!("{command} rejected"));
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AudioEngine for ScriptedEngine {
    async fn play_audio(&self, file_path: &str) -> Result<()> {
        self.record(format!("play_audio:{file_path}"));
        let remaining = self.play_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.play_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow!("device busy"));
        }
        let delay = *self.play_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.play_audio(file_path).await
    }

    async fn pause_audio(&self) -> Result<()> {
        self.record("pause_audio".into());
        self.check("pause_audio")?;
        self.inner.pause_audio().await
    }

    async fn resume_audio(&self) -> Result<()> {
        self.record("resume_audio".into());
        self.check("resume_audio")?;
        self.inner.resume_audio().await
    }

    async fn stop_audio(&self) -> Result<()> {
        self.record("stop_audio".into());
        self.inner.stop_audio().await
    }

    async fn set_volume(&self, volume: f64) -> Result<()> {
        self.record(format!("set_volume:{volume}"));
        self.check("set_volume")?;
        self.inner.set_volume(volume).await
    }

    async fn seek_to(&self, position: f64) -> Result<()> {
        self.record(format!("seek_to:{position}"));
        self.inner.seek_to(position).await
    }

    async fn update_duration(&self, duration: f64) -> Result<()> {
        self.record(format!("update_duration:{duration}"));
        self.inner.update_duration(duration).await
    }

    async fn get_playback_state(&self) -> Result<PlaybackState> {
        self.inner.get_playback_state().await
    }
}

/// What the fake element has been asked to do
#[derive(Debug, Default)]
pub struct ElementRecord {
    pub loads: Vec<String>,
    pub plays: u32,
    pub playing: bool,
    pub position: f64,
    pub volume: f64,
    pub play_failures: u32,
}

pub struct FakeElement {
    record: Arc<Mutex<ElementRecord>>,
    events: mpsc::UnboundedSender<MediaEvent>,
    source: Option<String>,
}

#[async_trait]
impl MediaElement for FakeElement {
    fn load(&mut self, source: &str) {
        self.source = Some(source.to_string());
        {
            let mut record = self.record.lock().unwrap();
            record.loads.push(source.to_string());
            record.playing = false;
            record.position = 0.0;
        }
        let _ = self.events.send(MediaEvent::LoadedMetadata {
            source: source.to_string(),
            duration: TRACK_SECONDS,
        });
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    async fn play(&mut self) -> Result<()> {
        let source = self.source.clone().ok_or_else(|| anyhow!("no source"))?;
        {
            let mut record = self.record.lock().unwrap();
            record.plays += 1;
            if record.play_failures > 0 {
                record.play_failures -= 1;
                return Err(anyhow!("play() rejected"));
            }
            record.playing = true;
        }
        let _ = self.events.send(MediaEvent::Play { source });
        Ok(())
    }

    fn pause(&mut self) {
        self.record.lock().unwrap().playing = false;
        if let Some(source) = self.source.clone() {
            let _ = self.events.send(MediaEvent::Pause { source });
        }
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.record.lock().unwrap().position = seconds;
    }

    fn current_time(&self) -> f64 {
        self.record.lock().unwrap().position
    }

    fn duration(&self) -> f64 {
        if self.source.is_some() { TRACK_SECONDS } else { 0.0 }
    }

    fn set_volume(&mut self, volume: f64) {
        self.record.lock().unwrap().volume = volume;
    }
}

/// A synchronizer wired to both doubles. Element events are only handled
/// when the test calls `pump`.
pub struct Harness {
    pub sync: PlaybackSynchronizer,
    pub engine: Arc<ScriptedEngine>,
    pub record: Arc<Mutex<ElementRecord>>,
    pub media_mode: MediaModeController,
    sender: mpsc::UnboundedSender<MediaEvent>,
    receiver: mpsc::UnboundedReceiver<MediaEvent>,
}

impl Harness {
    pub async fn new(mode: PlaybackMode) -> Self {
        Self::for_subsystem(mode, MediaType::Audio).await
    }

    /// A synchronizer driving `subsystem`, which starts out active.
    pub async fn for_subsystem(mode: PlaybackMode, subsystem: MediaType) -> Self {
        let store = PreferenceStore::in_memory();
        let media_mode = MediaModeController::new(store.clone(), subsystem, Duration::from_millis(300));
        let engine = Arc::new(ScriptedEngine::default());
        let record = Arc::new(Mutex::new(ElementRecord {
            volume: 1.0,
            ..ElementRecord::default()
        }));
        let (sender, receiver) = mpsc::unbounded_channel();
        let element = FakeElement {
            record: record.clone(),
            events: sender.clone(),
            source: None,
        };

        let sync = PlaybackSynchronizer::new(
            engine.clone(),
            Box::new(element),
            media_mode.clone(),
            store,
            SyncConfig::default(),
        )
        .with_subsystem(subsystem);
        sync.set_playback_mode(mode).await;
        sync.set_playlist(tracks()).await;

        Self {
            sync,
            engine,
            record,
            media_mode,
            sender,
            receiver,
        }
    }

    /// Handles queued element events, including any they cause, until none
    /// are left.
    pub async fn pump(&mut self) {
        while let Ok(event) = self.receiver.try_recv() {
            self.sync.handle_media_event(event).await;
        }
    }

    /// Takes the oldest queued element event without handling it, so a test
    /// can run the handler concurrently with a command.
    pub fn next_event(&mut self) -> Option<MediaEvent> {
        self.receiver.try_recv().ok()
    }

    /// Plays `track` and lets the start sequence run.
    pub async fn play(&mut self, track: &Track) {
        self.sync.play_track(track.clone()).await.unwrap();
        self.pump().await;
    }

    fn current_source(&self) -> String {
        self.record.lock().unwrap().loads.last().cloned().unwrap_or_default()
    }

    /// The element reaches the end of the loaded source.
    pub fn finish(&self) {
        self.record.lock().unwrap().playing = false;
        let _ = self.sender.send(MediaEvent::Ended {
            source: self.current_source(),
        });
    }

    pub fn fail(&self, message: &str) {
        let _ = self.sender.send(MediaEvent::Error {
            source: self.current_source(),
            message: message.to_string(),
        });
    }

    pub fn loads(&self) -> usize {
        self.record.lock().unwrap().loads.len()
    }
}

/// Drains everything a subscriber has received so far.
pub fn drain(events: &mut tokio::sync::broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}
