//! playsync demo - plays a list of files through the synchronizer using the
//! in-process engine and a timer-driven element.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{broadcast::error::RecvError, mpsc};

use playsync::model::JsonFileStore;
use playsync::{
    HeadlessElement, LocalEngine, MediaModeController, MediaType, PlaybackMode, PlaybackSynchronizer,
    PreferenceStore, SyncConfig, SyncEvent, Track, logging,
};

/// Command-line arguments for playsync
#[derive(Parser, Debug)]
#[command(name = "playsync")]
#[command(about = "Plays audio files through the playback synchronizer")]
#[command(version)]
struct Args {
    /// Files to queue, in order
    #[arg(required = true)]
    tracks: Vec<String>,

    /// JSON configuration file
    #[arg(short, long, env = "PLAYSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Simulated length of every track, in seconds
    #[arg(long, default_value = "5")]
    track_seconds: f64,

    /// sequence, loop_list, loop_single or shuffle
    #[arg(short, long, value_parser = parse_mode)]
    mode: Option<PlaybackMode>,

    /// audio or video
    #[arg(long, value_parser = parse_media_type)]
    media_type: Option<MediaType>,
}

fn parse_mode(value: &str) -> std::result::Result<PlaybackMode, String> {
    PlaybackMode::parse(value).ok_or_else(|| format!("unknown playback mode '{value}'"))
}

fn parse_media_type(value: &str) -> std::result::Result<MediaType, String> {
    MediaType::parse(value).ok_or_else(|| format!("unknown media type '{value}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };

    if let Err(e) = logging::init_logging(&config.log_dir) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
    tracing::info!("=== playsync starting ===");

    let store = PreferenceStore::new(Arc::new(JsonFileStore::open(&config.store_path)));
    let media_mode =
        MediaModeController::restore(store.clone(), MediaType::Audio, config.media_switch_settle()).await;
    if let Some(media_type) = args.media_type {
        media_mode.switch_to(media_type).await;
    }
    // The demo element plays whichever subsystem is active
    let subsystem = media_mode.current().await;
    let subsystem_info = subsystem.info();
    println!("{} {}", subsystem_info.icon, subsystem_info.label);

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let element = HeadlessElement::new(event_tx, args.track_seconds);
    let synchronizer = PlaybackSynchronizer::new(
        Arc::new(LocalEngine::new()),
        Box::new(element),
        media_mode,
        store,
        config,
    )
    .with_subsystem(subsystem);

    let mut events = synchronizer.subscribe();
    let listener = synchronizer.spawn_event_listener(event_rx);
    let reconciler = synchronizer.spawn_reconciler();
    let watcher = synchronizer.spawn_mode_watcher();
    synchronizer.initialize().await;

    if let Some(mode) = args.mode {
        synchronizer.set_playback_mode(mode).await;
    }
    let info = synchronizer.playback_mode_info().await;
    println!("{} {}", info.icon, info.label);

    let playlist: Vec<Track> = args.tracks.iter().map(Track::from_path).collect();
    synchronizer.set_playlist(playlist).await;
    let first = synchronizer
        .next_track()
        .await
        .context("Failed to start playback")?;
    tracing::info!(first = ?first.map(|t| t.file_path), "Playback requested");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SyncEvent::TrackStarted(track)) => println!("> {} - {}", track.artist, track.title),
                Ok(SyncEvent::Error(error)) => eprintln!("! {}", error.user_message()),
                Ok(SyncEvent::PlaybackEnded) => break,
                Ok(SyncEvent::StateChanged(_)) => {}
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "Status output lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    synchronizer.clear().await;
    listener.abort();
    reconciler.abort();
    watcher.abort();
    tracing::info!("playsync shutting down");
    Ok(())
}
