//! Core type definitions shared by every component

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A playable track. Identity is `file_path`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Length in seconds, `0.0` when unknown.
    pub duration: f64,
    pub file_path: String,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration: f64,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            duration,
            file_path: file_path.into(),
        }
    }

    /// Builds an untagged track whose title is the file stem.
    pub fn from_path(file_path: impl Into<String>) -> Self {
        let file_path = file_path.into();
        let title = Path::new(&file_path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.clone());

        Self {
            title,
            artist: "Unknown Artist".to_string(),
            album: "Unknown Album".to_string(),
            duration: 0.0,
            file_path,
        }
    }

    pub fn id(&self) -> &str {
        &self.file_path
    }

    pub fn same_as(&self, other: &Track) -> bool {
        self.file_path == other.file_path
    }
}

/// Direction of a track change request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Track advancement policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    #[default]
    Sequence,
    LoopList,
    LoopSingle,
    Shuffle,
}

/// Display metadata for a playback mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackModeInfo {
    pub mode: PlaybackMode,
    pub label: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

impl PlaybackMode {
    pub const ALL: [PlaybackMode; 4] = [
        PlaybackMode::Sequence,
        PlaybackMode::LoopList,
        PlaybackMode::LoopSingle,
        PlaybackMode::Shuffle,
    ];

    /// Cycles Sequence -> LoopList -> LoopSingle -> Shuffle -> Sequence.
    pub fn next(self) -> Self {
        match self {
            PlaybackMode::Sequence => PlaybackMode::LoopList,
            PlaybackMode::LoopList => PlaybackMode::LoopSingle,
            PlaybackMode::LoopSingle => PlaybackMode::Shuffle,
            PlaybackMode::Shuffle => PlaybackMode::Sequence,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackMode::Sequence => "sequence",
            PlaybackMode::LoopList => "loop_list",
            PlaybackMode::LoopSingle => "loop_single",
            PlaybackMode::Shuffle => "shuffle",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == value)
    }

    pub fn info(self) -> PlaybackModeInfo {
        let (label, icon, description) = match self {
            PlaybackMode::Sequence => (
                "Sequence",
                "list-ordered",
                "Play in order and stop after the last track",
            ),
            PlaybackMode::LoopList => ("Loop list", "repeat", "Start over after the last track"),
            PlaybackMode::LoopSingle => ("Loop single", "repeat-1", "Repeat the current track"),
            PlaybackMode::Shuffle => ("Shuffle", "shuffle", "Play the list in random order"),
        };
        PlaybackModeInfo {
            mode: self,
            label,
            icon,
            description,
        }
    }
}

/// Which playback subsystem is in charge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Audio,
    Video,
}

/// Display metadata for a media type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaTypeInfo {
    pub media_type: MediaType,
    pub label: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

impl MediaType {
    pub fn other(self) -> Self {
        match self {
            MediaType::Audio => MediaType::Video,
            MediaType::Video => MediaType::Audio,
        }
    }

    pub fn is_audio(self) -> bool {
        self == MediaType::Audio
    }

    pub fn is_video(self) -> bool {
        self == MediaType::Video
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::Video => "video",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "audio" => Some(MediaType::Audio),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }

    pub fn info(self) -> MediaTypeInfo {
        match self {
            MediaType::Audio => MediaTypeInfo {
                media_type: self,
                label: "Audio mode",
                icon: "🎵",
                description: "Play audio files",
            },
            MediaType::Video => MediaTypeInfo {
                media_type: self,
                label: "Video mode",
                icon: "🎬",
                description: "Play video files",
            },
        }
    }
}
