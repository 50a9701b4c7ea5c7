//! TOML configuration file loading
//!
//! Supports `~/.config/dhwani/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct DhwaniConfigFile {
    /// Path to a replacement FAQ table
    #[serde(default)]
    pub faq_path: Option<String>,

    /// Speech recognition settings
    #[serde(default)]
    pub stt: SttFileConfig,

    /// Speech synthesis settings
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// Translation settings
    #[serde(default)]
    pub translation: TranslationFileConfig,

    /// Conversation phrasing and timing
    #[serde(default)]
    pub conversation: ConversationFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Startup checks
    #[serde(default)]
    pub preflight: PreflightFileConfig,
}

/// STT configuration
#[derive(Debug, Default, Deserialize)]
pub struct SttFileConfig {
    /// Provider ("deepgram" or "whisper")
    pub provider: Option<String>,

    /// Model identifier (e.g. "nova-2")
    pub model: Option<String>,

    /// Spoken language tag (e.g. "en-US")
    pub language: Option<String>,
}

/// TTS configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// Provider ("google", "openai" or "elevenlabs")
    pub provider: Option<String>,

    /// Model identifier
    pub model: Option<String>,

    /// Voice identifier (e.g. "alloy")
    pub voice: Option<String>,

    /// Speed multiplier
    pub speed: Option<f32>,
}

/// Translation configuration
#[derive(Debug, Default, Deserialize)]
pub struct TranslationFileConfig {
    /// Source language (ISO 639-1)
    pub source: Option<String>,

    /// Target language (ISO 639-1)
    pub target: Option<String>,

    /// Endpoint override
    pub endpoint: Option<String>,
}

/// Conversation configuration
#[derive(Debug, Default, Deserialize)]
pub struct ConversationFileConfig {
    pub introduction: Option<String>,
    pub announcement: Option<String>,
    pub affirmative: Option<String>,
    pub speak_english_answer: Option<bool>,

    /// Seconds to wait for speech before giving up
    pub listen_timeout_secs: Option<u64>,

    /// Milliseconds of silence that end an utterance
    pub pause_ms: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Preflight configuration
#[derive(Debug, Default, Deserialize)]
pub struct PreflightFileConfig {
    /// Executables that must be on `PATH`
    pub executables: Option<Vec<String>>,
}

/// Load the TOML config file
///
/// Uses `path` when given, otherwise the standard location. Returns
/// `DhwaniConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> DhwaniConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return DhwaniConfigFile::default();
    };

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file");
        return DhwaniConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                DhwaniConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            DhwaniConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/dhwani/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("dhwani").join("config.toml"))
}
