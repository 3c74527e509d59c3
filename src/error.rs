//! Error types for playsync

use thiserror::Error;

use crate::model::MediaType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// An engine command was rejected
    #[error("Engine command '{command}' failed: {message}")]
    Engine { command: &'static str, message: String },

    /// The local media element reported an error
    #[error("Media error: {0}")]
    Media(String),

    /// Starting or resuming a track failed after the single reload
    #[error("Could not play {file_path}: {message}")]
    PlaybackFailed { file_path: String, message: String },

    /// The subsystem this synchronizer drives is not the active one
    #[error("The {} subsystem is not active", .0.as_str())]
    SubsystemInactive(MediaType),

    #[error("No track selected")]
    NoTrackSelected,
}

impl PlayerError {
    pub fn engine(command: &'static str, error: &anyhow::Error) -> Self {
        PlayerError::Engine {
            command,
            message: error.to_string(),
        }
    }

    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            PlayerError::Engine { .. } => "The audio engine did not respond. Try again.".to_string(),
            PlayerError::Media(message) => format!("Playback error: {message}"),
            PlayerError::PlaybackFailed { file_path, .. } => {
                let name = file_path.rsplit(['/', '\\']).next().unwrap_or(file_path);
                format!("Could not play {name}")
            }
            PlayerError::SubsystemInactive(media_type) => {
                format!("Switch to {} mode to play this", media_type.as_str())
            }
            PlayerError::NoTrackSelected => "Nothing to play".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_uses_file_name() {
        let error = PlayerError::PlaybackFailed {
            file_path: "/music/album/song.flac".into(),
            message: "decode".into(),
        };
        assert_eq!(error.user_message(), "Could not play song.flac");
    }

    #[test]
    fn test_display_names_the_subsystem() {
        let error = PlayerError::SubsystemInactive(MediaType::Audio);
        assert_eq!(error.to_string(), "The audio subsystem is not active");
    }
}
