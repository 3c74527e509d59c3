//! What happens when the element reports `ended`, per playback mode

mod helpers;

use std::collections::HashSet;
use std::time::Duration;

use helpers::{Harness, drain, tracks};
use playsync::{PlaybackMode, SyncEvent};

#[tokio::test]
async fn test_sequence_stops_after_last_track() {
    let mut h = Harness::new(PlaybackMode::Sequence).await;
    let mut events = h.sync.subscribe();
    let c = tracks()[2].clone();
    h.play(&c).await;
    assert!(!h.sync.should_auto_play().await);

    h.finish();
    h.pump().await;

    assert!(!h.sync.state().await.is_playing);
    assert_eq!(h.sync.selected_track().await, Some(c));
    assert!(h.engine.called("stop_audio"));
    assert_eq!(h.loads(), 1);
    assert!(drain(&mut events).contains(&SyncEvent::PlaybackEnded));
}

#[tokio::test]
async fn test_sequence_advances_to_next_track() {
    let mut h = Harness::new(PlaybackMode::Sequence).await;
    h.play(&tracks()[0]).await;

    h.finish();
    h.pump().await;

    assert_eq!(h.sync.selected_track().await, Some(tracks()[1].clone()));
    let state = h.sync.state().await;
    assert!(state.is_playing);
    assert_eq!(state.current_track_id.as_deref(), Some("/music/b.mp3"));
}

#[tokio::test]
async fn test_engine_is_stopped_before_advancing() {
    let mut h = Harness::new(PlaybackMode::LoopList).await;
    h.play(&tracks()[0]).await;

    h.finish();
    h.pump().await;

    let calls = h.engine.calls();
    let stop = calls.iter().position(|c| c == "stop_audio").unwrap();
    let next = calls.iter().position(|c| c == "play_audio:/music/b.mp3").unwrap();
    assert!(stop < next);
    assert_eq!(h.engine.count("seek_to:0"), 2);
}

#[tokio::test]
async fn test_loop_list_wraps_to_first_track() {
    let mut h = Harness::new(PlaybackMode::LoopList).await;
    h.play(&tracks()[2]).await;
    assert!(h.sync.should_auto_play().await);

    h.finish();
    h.pump().await;

    assert_eq!(h.sync.selected_track().await, Some(tracks()[0].clone()));
    assert!(h.sync.state().await.is_playing);
}

#[tokio::test(start_paused = true)]
async fn test_loop_single_replays_after_delay() {
    let mut h = Harness::new(PlaybackMode::LoopSingle).await;
    let a = tracks()[0].clone();
    h.play(&a).await;

    let ended_at = tokio::time::Instant::now();
    h.finish();
    h.pump().await;

    assert!(ended_at.elapsed() >= Duration::from_millis(100));
    assert_eq!(h.loads(), 2);
    assert_eq!(h.engine.count("play_audio:/music/a.mp3"), 2);
    assert_eq!(h.sync.selected_track().await, Some(a));
    assert!(h.sync.state().await.is_playing);
}

#[tokio::test]
async fn test_user_next_and_previous_follow_the_mode() {
    let mut h = Harness::new(PlaybackMode::Sequence).await;
    h.play(&tracks()[0]).await;

    // Sequence does not wrap backwards
    assert_eq!(h.sync.previous_track().await.unwrap(), None);
    assert_eq!(h.sync.next_track().await.unwrap(), Some(tracks()[1].clone()));
    h.pump().await;

    h.sync.set_playback_mode(PlaybackMode::LoopList).await;
    h.play(&tracks()[0]).await;
    assert_eq!(h.sync.previous_track().await.unwrap(), Some(tracks()[2].clone()));
}

#[tokio::test]
async fn test_shuffle_visits_every_track_once_per_pass() {
    let mut h = Harness::new(PlaybackMode::Shuffle).await;

    let mut seen = HashSet::new();
    for _ in 0..3 {
        let track = h.sync.next_track().await.unwrap().unwrap();
        h.pump().await;
        seen.insert(track.file_path);
    }
    assert_eq!(seen.len(), 3);
}

#[tokio::test]
async fn test_playback_mode_is_persisted_and_cycled() {
    let h = Harness::new(PlaybackMode::Sequence).await;

    assert_eq!(h.sync.cycle_playback_mode().await, PlaybackMode::LoopList);
    assert_eq!(h.sync.playback_mode().await, PlaybackMode::LoopList);
    assert!(!h.sync.set_playback_mode(PlaybackMode::LoopList).await);
    assert_eq!(h.sync.playback_mode_info().await.mode, PlaybackMode::LoopList);
}
