//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable consulted when `api.api_key` is not set.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Connection settings for the remote model that ingests content, speaks
/// sentences, scores attempts and writes the session review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the `generateContent` API, without trailing slash.
    pub base_url: String,
    /// API key.  `None` falls back to the `GEMINI_API_KEY` environment variable.
    pub api_key: Option<String>,
    /// Model that turns uploaded text/files into a practice script.
    pub content_model: String,
    /// Text-to-speech model.
    pub speech_model: String,
    /// Model that scores a recording against its target text.
    pub scoring_model: String,
    /// Model that writes the end-of-session review.
    pub review_model: String,
    /// Prebuilt voice used for synthesis.
    pub voice: String,
    /// Maximum seconds to wait for any single request.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            content_model: "gemini-2.5-flash".into(),
            speech_model: "gemini-2.5-flash-preview-tts".into(),
            scoring_model: "gemini-2.5-flash".into(),
            review_model: "gemini-2.5-flash".into(),
            voice: "Kore".into(),
            timeout_secs: 60,
        }
    }
}

impl ApiConfig {
    /// The configured key, or the environment fallback.  Empty strings count
    /// as unset.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for capture, playback and the live waveform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate of the encoded recording sent to the scorer.
    pub recording_sample_rate: u32,
    /// Sample rate of the PCM returned by the speech model.
    pub speech_sample_rate: u32,
    /// Number of bars in the recording waveform.
    pub waveform_bars: usize,
    /// Number of recent microphone samples the waveform is computed from.
    pub monitor_samples: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            recording_sample_rate: 16_000,
            speech_sample_rate: 24_000,
            waveform_bars: 30,
            monitor_samples: 4_096,
        }
    }
}

impl AudioConfig {
    /// Replace zero rates and sizes, which would produce empty or unplayable
    /// audio, with their defaults.
    fn sanitize(&mut self) {
        let defaults = Self::default();
        if self.recording_sample_rate == 0 {
            log::warn!(
                "config: recording_sample_rate = 0 is invalid; using {}",
                defaults.recording_sample_rate
            );
            self.recording_sample_rate = defaults.recording_sample_rate;
        }
        if self.speech_sample_rate == 0 {
            log::warn!(
                "config: speech_sample_rate = 0 is invalid; using {}",
                defaults.speech_sample_rate
            );
            self.speech_sample_rate = defaults.speech_sample_rate;
        }
        if self.waveform_bars == 0 {
            self.waveform_bars = defaults.waveform_bars;
        }
        if self.monitor_samples == 0 {
            self.monitor_samples = defaults.monitor_samples;
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Settings for script generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound on sentences requested from the ingestion model for long
    /// inputs.
    pub max_sentences: usize,
    /// Language of the translations shown under each sentence.
    pub translation_language: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sentences: 15,
            translation_language: "Chinese".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// eframe window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial window size in logical pixels.
    pub window_size: (f32, f32),
    /// Keep the window above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (960.0, 640.0),
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use shadow_practice::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub audio: AudioConfig,
    pub session: SessionConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.audio.sanitize();
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.api.base_url, loaded.api.base_url);
        assert_eq!(original.api.api_key, loaded.api.api_key);
        assert_eq!(original.api.speech_model, loaded.api.speech_model);
        assert_eq!(original.api.voice, loaded.api.voice);
        assert_eq!(original.api.timeout_secs, loaded.api.timeout_secs);

        assert_eq!(
            original.audio.recording_sample_rate,
            loaded.audio.recording_sample_rate
        );
        assert_eq!(original.audio.waveform_bars, loaded.audio.waveform_bars);

        assert_eq!(original.session.max_sentences, loaded.session.max_sentences);
        assert_eq!(original.ui.window_size, loaded.ui.window_size);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.api.voice, "Kore");
        assert_eq!(config.audio.speech_sample_rate, 24_000);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.api.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(cfg.api.speech_model, "gemini-2.5-flash-preview-tts");
        assert!(cfg.api.api_key.is_none());
        assert_eq!(cfg.audio.recording_sample_rate, 16_000);
        assert_eq!(cfg.audio.waveform_bars, 30);
        assert_eq!(cfg.session.max_sentences, 15);
        assert!(!cfg.ui.always_on_top);
    }

    /// A partial file only overrides the keys it names.
    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[api]\nvoice = \"Puck\"\n\n[session]\nmax_sentences = 8\n")
            .unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.api.voice, "Puck");
        assert_eq!(cfg.api.speech_model, "gemini-2.5-flash-preview-tts");
        assert_eq!(cfg.session.max_sentences, 8);
        assert_eq!(cfg.audio.recording_sample_rate, 16_000);
    }

    #[test]
    fn zero_sample_rates_fall_back_to_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("zero.toml");
        std::fs::write(
            &path,
            "[audio]\nrecording_sample_rate = 0\nspeech_sample_rate = 0\nwaveform_bars = 12\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.audio.recording_sample_rate, 16_000);
        assert_eq!(cfg.audio.speech_sample_rate, 24_000);
        assert_eq!(cfg.audio.waveform_bars, 12);
    }

    #[test]
    fn explicit_api_key_wins() {
        let mut api = ApiConfig::default();
        api.api_key = Some("from-file".into());
        assert_eq!(api.resolved_api_key().as_deref(), Some("from-file"));
    }
}
