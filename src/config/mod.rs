//! Configuration management for Dhwani
//!
//! Every setting resolves env > TOML file > default.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assistant::AssistantConfig;
use crate::faq::FaqTable;
use crate::preflight::DEFAULT_EXECUTABLES;
use crate::translate::GOOGLE_TRANSLATE_URL;
use crate::voice::{DEFAULT_PAUSE, SpeechToText, SttProvider, TextToSpeech, TtsProvider};
use crate::{Error, Result};

use self::file::DhwaniConfigFile;

/// Dhwani configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Replacement FAQ table, if any
    pub faq_path: Option<PathBuf>,

    /// Speech recognition configuration
    pub stt: SttConfig,

    /// Speech synthesis configuration
    pub tts: TtsConfig,

    /// Translation configuration
    pub translation: TranslationConfig,

    /// Conversation phrasing and timing
    pub conversation: ConversationConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Executables that must be on `PATH` at startup
    pub required_executables: Vec<String>,
}

/// Speech recognition configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Provider backend
    pub provider: SttProvider,

    /// Model identifier
    pub model: String,

    /// Spoken language tag (e.g. "en-US")
    pub language: String,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Provider backend
    pub provider: TtsProvider,

    /// Model identifier (unused by Google)
    pub model: String,

    /// Voice identifier (unused by Google)
    pub voice: String,

    /// Speed multiplier (0.25 to 4.0, `OpenAI` only)
    pub speed: f32,
}

/// Translation configuration
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    /// Language of questions and answers
    pub source: String,

    /// Language of the second spoken reply
    pub target: String,

    /// Translation endpoint
    pub endpoint: String,
}

/// Conversation configuration
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    pub introduction: Option<String>,
    pub announcement: Option<String>,
    pub affirmative: Option<String>,
    pub speak_english_answer: bool,

    /// How long to wait for speech before reporting nothing heard
    pub listen_timeout: Duration,

    /// Silence that ends an utterance
    pub pause: Duration,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<String>,

    /// Deepgram API key (optional STT)
    pub deepgram: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a provider name is unknown
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(config_path);
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a provider name is unknown
    pub fn from_sources<F>(fc: DhwaniConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
            deepgram: env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram),
            elevenlabs: env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
        };

        // STT (env > toml > default)
        let stt_provider = env("DHWANI_STT_PROVIDER")
            .or(fc.stt.provider)
            .map_or(Ok(SttProvider::Deepgram), |s| SttProvider::parse(&s))?;
        let stt = SttConfig {
            provider: stt_provider,
            model: env("DHWANI_STT_MODEL")
                .or(fc.stt.model)
                .unwrap_or_else(|| stt_provider.default_model().to_string()),
            language: env("DHWANI_STT_LANGUAGE")
                .or(fc.stt.language)
                .unwrap_or_else(|| "en-US".to_string()),
        };

        // TTS (env > toml > default)
        let tts_provider = env("DHWANI_TTS_PROVIDER")
            .or(fc.tts.provider)
            .map_or(Ok(TtsProvider::Google), |s| TtsProvider::parse(&s))?;
        let default_tts_model = match tts_provider {
            TtsProvider::Google => "",
            TtsProvider::OpenAI => "tts-1",
            TtsProvider::ElevenLabs => "eleven_multilingual_v2",
        };
        let tts = TtsConfig {
            provider: tts_provider,
            model: env("DHWANI_TTS_MODEL")
                .or(fc.tts.model)
                .unwrap_or_else(|| default_tts_model.to_string()),
            voice: env("DHWANI_TTS_VOICE")
                .or(fc.tts.voice)
                .unwrap_or_else(|| "alloy".to_string()),
            speed: env("DHWANI_TTS_SPEED")
                .and_then(|s| s.parse().ok())
                .or(fc.tts.speed)
                .unwrap_or(1.0)
                .clamp(0.25, 4.0),
        };

        let translation = TranslationConfig {
            source: env("DHWANI_SOURCE_LANG")
                .or(fc.translation.source)
                .unwrap_or_else(|| "en".to_string()),
            target: env("DHWANI_TARGET_LANG")
                .or(fc.translation.target)
                .unwrap_or_else(|| "hi".to_string()),
            endpoint: env("DHWANI_TRANSLATE_URL")
                .or(fc.translation.endpoint)
                .unwrap_or_else(|| GOOGLE_TRANSLATE_URL.to_string()),
        };

        let conv = fc.conversation;
        let conversation = ConversationConfig {
            introduction: conv.introduction,
            announcement: conv.announcement,
            affirmative: conv.affirmative,
            speak_english_answer: conv.speak_english_answer.unwrap_or(true),
            listen_timeout: Duration::from_secs(
                env("DHWANI_LISTEN_TIMEOUT")
                    .and_then(|s| s.parse().ok())
                    .or(conv.listen_timeout_secs)
                    .unwrap_or(15),
            ),
            pause: conv.pause_ms.map_or(DEFAULT_PAUSE, Duration::from_millis),
        };

        let faq_path = env("DHWANI_FAQ_PATH").or(fc.faq_path).map(PathBuf::from);

        let required_executables = fc.preflight.executables.unwrap_or_else(|| {
            DEFAULT_EXECUTABLES
                .iter()
                .map(|s| (*s).to_string())
                .collect()
        });

        Ok(Self {
            faq_path,
            stt,
            tts,
            translation,
            conversation,
            api_keys,
            required_executables,
        })
    }

    /// Load the FAQ table (configured file or built-in)
    ///
    /// # Errors
    ///
    /// Returns error if the configured file is unreadable or invalid
    pub fn faq_table(&self) -> Result<FaqTable> {
        self.faq_path
            .as_deref()
            .map_or_else(|| Ok(FaqTable::builtin()), FaqTable::load)
    }

    /// Build the STT client for the configured provider
    ///
    /// # Errors
    ///
    /// Returns error if the provider's API key is missing
    pub fn speech_to_text(&self) -> Result<SpeechToText> {
        let stt = &self.stt;
        match stt.provider {
            SttProvider::Whisper => SpeechToText::new_whisper(
                required_key(self.api_keys.openai.as_deref(), "OPENAI_API_KEY")?,
                stt.model.clone(),
                stt.language.clone(),
            ),
            SttProvider::Deepgram => SpeechToText::new_deepgram(
                required_key(self.api_keys.deepgram.as_deref(), "DEEPGRAM_API_KEY")?,
                stt.model.clone(),
                stt.language.clone(),
            ),
        }
    }

    /// Build the TTS client for the configured provider
    ///
    /// # Errors
    ///
    /// Returns error if the provider's API key is missing
    pub fn text_to_speech(&self) -> Result<TextToSpeech> {
        let tts = &self.tts;
        match tts.provider {
            TtsProvider::Google => Ok(TextToSpeech::new_google()),
            TtsProvider::OpenAI => TextToSpeech::new_openai(
                required_key(self.api_keys.openai.as_deref(), "OPENAI_API_KEY")?,
                tts.voice.clone(),
                tts.speed,
                tts.model.clone(),
            ),
            TtsProvider::ElevenLabs => TextToSpeech::new_elevenlabs(
                required_key(self.api_keys.elevenlabs.as_deref(), "ELEVENLABS_API_KEY")?,
                tts.voice.clone(),
                tts.model.clone(),
            ),
        }
    }

    /// Conversation settings for the assistant
    #[must_use]
    pub fn assistant_config(&self) -> AssistantConfig {
        let defaults = AssistantConfig::default();
        let conv = &self.conversation;

        AssistantConfig {
            introduction: conv.introduction.clone().unwrap_or(defaults.introduction),
            announcement: conv.announcement.clone().unwrap_or(defaults.announcement),
            affirmative: conv.affirmative.clone().unwrap_or(defaults.affirmative),
            source_lang: self.translation.source.clone(),
            target_lang: self.translation.target.clone(),
            speak_source_answer: conv.speak_english_answer,
            ..defaults
        }
    }
}

fn required_key(key: Option<&str>, var: &str) -> Result<String> {
    key.filter(|k| !k.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| Error::Config(format!("{var} is not set")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(DhwaniConfigFile::default(), env_from(&[])).unwrap();

        assert_eq!(config.stt.provider, SttProvider::Deepgram);
        assert_eq!(config.stt.model, "nova-2");
        assert_eq!(config.stt.language, "en-US");
        assert_eq!(config.tts.provider, TtsProvider::Google);
        assert_eq!(config.translation.source, "en");
        assert_eq!(config.translation.target, "hi");
        assert_eq!(config.required_executables, vec!["ffmpeg", "ffprobe"]);
        assert_eq!(config.conversation.listen_timeout, Duration::from_secs(15));
        assert!(config.faq_path.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let fc: DhwaniConfigFile = toml::from_str(
            r#"
            [stt]
            provider = "whisper"
            model = "from-file"

            [api_keys]
            openai = "file-key"
            "#,
        )
        .unwrap();

        let config = Config::from_sources(
            fc,
            env_from(&[("DHWANI_STT_PROVIDER", "deepgram"), ("OPENAI_API_KEY", "env-key")]),
        )
        .unwrap();

        assert_eq!(config.stt.provider, SttProvider::Deepgram);
        assert_eq!(config.stt.model, "from-file");
        assert_eq!(config.api_keys.openai.as_deref(), Some("env-key"));
    }

    #[test]
    fn test_unknown_provider_is_error() {
        let result = Config::from_sources(
            DhwaniConfigFile::default(),
            env_from(&[("DHWANI_TTS_PROVIDER", "espeak")]),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_key_fails_client_construction() {
        let config = Config::from_sources(DhwaniConfigFile::default(), env_from(&[])).unwrap();
        let err = config.speech_to_text().err().unwrap();
        assert!(err.to_string().contains("DEEPGRAM_API_KEY"));

        // Google TTS needs no key
        assert!(config.text_to_speech().is_ok());
    }

    #[tokio::test]
    async fn test_default_recognizer_feeds_faq_lookup() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/listen")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("model".into(), "nova-2".into()),
                mockito::Matcher::UrlEncoded("punctuate".into(), "false".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results": {"channels": [{"alternatives": [
                    {"transcript": "how can i check my account balance"}
                ]}]}}"#,
            )
            .create_async()
            .await;

        let config = Config::from_sources(
            DhwaniConfigFile::default(),
            env_from(&[("DEEPGRAM_API_KEY", "dg-key")]),
        )
        .unwrap();
        let stt = config.speech_to_text().unwrap().with_base_url(server.url());
        let text = stt.transcribe(&[0u8; 64]).await.unwrap();

        mock.assert_async().await;
        let faq = config.faq_table().unwrap();
        assert!(faq.answer(&text).starts_with("You can check your account balance"));
    }

    #[test]
    fn test_assistant_config_overrides() {
        let fc: DhwaniConfigFile = toml::from_str(
            r#"
            [conversation]
            affirmative = "haan"
            speak_english_answer = false
            "#,
        )
        .unwrap();

        let config = Config::from_sources(fc, env_from(&[("DHWANI_TARGET_LANG", "ta")])).unwrap();
        let assistant = config.assistant_config();

        assert_eq!(assistant.affirmative, "haan");
        assert_eq!(assistant.target_lang, "ta");
        assert!(!assistant.speak_source_answer);
        assert_eq!(assistant.announcement, "The answer is:");
    }
}
