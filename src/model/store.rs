//! Key/value persistence for preferences that survive restarts
//!
//! Values are JSON. Anything missing or unreadable is treated as absent and
//! the documented defaults apply (`MediaType::Audio`, `PlaybackMode::Sequence`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::playback::MediaTypeState;
use super::types::{MediaType, PlaybackMode};

pub const MEDIA_TYPE_KEY: &str = "preferredMediaType";
pub const MEDIA_TYPE_STATE_KEY: &str = "mediaTypeState";
pub const PLAYBACK_MODE_KEY: &str = "playbackMode";
pub const PLAYBACK_PREFERENCES_KEY: &str = "playbackPreferences";

const ALL_KEYS: [&str; 4] = [
    MEDIA_TYPE_KEY,
    MEDIA_TYPE_STATE_KEY,
    PLAYBACK_MODE_KEY,
    PLAYBACK_PREFERENCES_KEY,
];

/// Narrow string-keyed, JSON-valued store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store, used by tests and when no file is configured
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a raw value, bypassing any validation.
    pub fn seed(&self, key: &str, value: Value) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value);
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        values.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk, rewritten on every change
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<HashMap<String, Value>>,
}

impl JsonFileStore {
    /// Opens the store. A missing or corrupt file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::load_from_disk(&path) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable preference file");
                HashMap::new()
            }
        };
        Self {
            path,
            values: RwLock::new(values),
        }
    }

    fn load_from_disk(path: &Path) -> Result<HashMap<String, Value>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_to_disk(&self, values: &HashMap<String, Value>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let content = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("preference store lock poisoned"))?;
        values.insert(key.to_string(), value);
        self.save_to_disk(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("preference store lock poisoned"))?;
        if values.remove(key).is_some() {
            self.save_to_disk(&values)?;
        }
        Ok(())
    }
}

/// Generic playback preferences object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackPreferences {
    pub media_type: MediaType,
    pub auto_switch_on_file_type: bool,
    pub remember_last_position: bool,
    pub continuous_playback: bool,
    pub last_switch_time: i64,
}

impl Default for PlaybackPreferences {
    fn default() -> Self {
        Self {
            media_type: MediaType::Audio,
            auto_switch_on_file_type: false,
            remember_last_position: true,
            continuous_playback: true,
            last_switch_time: 0,
        }
    }
}

/// On-disk shape of `MediaTypeState`; the transient flag is not kept.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedMediaTypeState {
    pub current_type: MediaType,
    pub last_switch_time: i64,
}

/// Typed accessors over a `KeyValueStore`.
///
/// Reads never fail; writes log and swallow errors since losing a preference
/// must not interrupt playback.
#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<dyn KeyValueStore>,
}

impl PreferenceStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.inner.get(key)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding invalid persisted value");
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_value(value)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.inner.set(key, json));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Failed to persist preference");
        }
    }

    pub fn media_type(&self) -> Option<MediaType> {
        self.read(MEDIA_TYPE_KEY)
    }

    /// Persists the preferred type and refreshes the preferences object.
    pub fn set_media_type(&self, media_type: MediaType) {
        self.write(MEDIA_TYPE_KEY, &media_type);

        let mut preferences = self.playback_preferences();
        preferences.media_type = media_type;
        preferences.last_switch_time = chrono::Utc::now().timestamp_millis();
        self.set_playback_preferences(&preferences);
    }

    pub fn media_type_state(&self) -> Option<PersistedMediaTypeState> {
        self.read(MEDIA_TYPE_STATE_KEY)
    }

    pub fn set_media_type_state(&self, state: &MediaTypeState) {
        let last_switch_time = if state.last_switch_time > 0 {
            state.last_switch_time
        } else {
            chrono::Utc::now().timestamp_millis()
        };
        self.write(
            MEDIA_TYPE_STATE_KEY,
            &PersistedMediaTypeState {
                current_type: state.current_type,
                last_switch_time,
            },
        );
    }

    /// Persisted playback mode, `Sequence` when absent or invalid.
    pub fn playback_mode(&self) -> PlaybackMode {
        self.read(PLAYBACK_MODE_KEY).unwrap_or_default()
    }

    pub fn set_playback_mode(&self, mode: PlaybackMode) {
        self.write(PLAYBACK_MODE_KEY, &mode);
    }

    pub fn playback_preferences(&self) -> PlaybackPreferences {
        self.read(PLAYBACK_PREFERENCES_KEY).unwrap_or_default()
    }

    pub fn set_playback_preferences(&self, preferences: &PlaybackPreferences) {
        self.write(PLAYBACK_PREFERENCES_KEY, preferences);
    }

    /// Removes every key this crate owns.
    pub fn clear(&self) {
        for key in ALL_KEYS {
            if let Err(e) = self.inner.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear preference");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_when_empty() {
        let store = PreferenceStore::in_memory();
        assert_eq!(store.media_type(), None);
        assert_eq!(store.playback_mode(), PlaybackMode::Sequence);
        assert_eq!(store.playback_preferences(), PlaybackPreferences::default());
    }

    #[test]
    fn test_corrupt_values_fall_back() {
        let memory = Arc::new(MemoryStore::new());
        memory.seed(MEDIA_TYPE_KEY, json!("hologram"));
        memory.seed(PLAYBACK_MODE_KEY, json!(42));
        memory.seed(PLAYBACK_PREFERENCES_KEY, json!("not an object"));

        let store = PreferenceStore::new(memory);
        assert_eq!(store.media_type(), None);
        assert_eq!(store.playback_mode(), PlaybackMode::Sequence);
        assert_eq!(store.playback_preferences(), PlaybackPreferences::default());
    }

    #[test]
    fn test_set_media_type_updates_preferences() {
        let store = PreferenceStore::in_memory();
        store.set_media_type(MediaType::Video);

        assert_eq!(store.media_type(), Some(MediaType::Video));
        let preferences = store.playback_preferences();
        assert_eq!(preferences.media_type, MediaType::Video);
        assert!(preferences.last_switch_time > 0);
    }

    #[test]
    fn test_media_type_state_drops_transient_flag() {
        let memory = Arc::new(MemoryStore::new());
        let store = PreferenceStore::new(memory.clone());
        store.set_media_type_state(&MediaTypeState {
            current_type: MediaType::Video,
            is_transitioning: true,
            last_switch_time: 1234,
        });

        let raw = memory.get(MEDIA_TYPE_STATE_KEY).unwrap();
        assert_eq!(raw, json!({ "currentType": "video", "lastSwitchTime": 1234 }));
    }

    #[test]
    fn test_partial_preferences_keep_defaults() {
        let memory = Arc::new(MemoryStore::new());
        memory.seed(PLAYBACK_PREFERENCES_KEY, json!({ "continuousPlayback": false }));

        let preferences = PreferenceStore::new(memory).playback_preferences();
        assert!(!preferences.continuous_playback);
        assert!(preferences.remember_last_position);
    }

    #[test]
    fn test_clear_removes_all_keys() {
        let memory = Arc::new(MemoryStore::new());
        let store = PreferenceStore::new(memory.clone());
        store.set_playback_mode(PlaybackMode::Shuffle);
        store.set_media_type(MediaType::Video);

        store.clear();

        for key in ALL_KEYS {
            assert!(memory.get(key).is_none(), "{key} should be removed");
        }
    }

    #[test]
    fn test_json_file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        {
            let store = PreferenceStore::new(Arc::new(JsonFileStore::open(&path)));
            store.set_playback_mode(PlaybackMode::LoopList);
        }

        let reopened = PreferenceStore::new(Arc::new(JsonFileStore::open(&path)));
        assert_eq!(reopened.playback_mode(), PlaybackMode::LoopList);
    }

    #[test]
    fn test_json_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert!(store.get(PLAYBACK_MODE_KEY).is_none());
    }
}
