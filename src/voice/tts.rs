//! Text-to-speech (TTS) processing

use crate::{Error, Result};

/// Default Google Translate TTS endpoint
pub const GOOGLE_TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Default `OpenAI` API base
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default ElevenLabs API base
pub const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Longest text the Google endpoint accepts per request
pub const GOOGLE_MAX_CHARS: usize = 100;

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsProvider {
    /// Google Translate voice, no key required
    Google,
    /// `OpenAI` speech API
    OpenAI,
    /// ElevenLabs
    ElevenLabs,
}

impl TtsProvider {
    /// Parse a provider name
    ///
    /// # Errors
    ///
    /// Returns error for unknown names
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "google" | "gtts" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAI),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speed: f32,
    model: String,
    provider: TtsProvider,
    base_url: String,
}

impl TextToSpeech {
    /// Create a new TTS instance using the Google Translate voice
    #[must_use]
    pub fn new_google() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: String::new(),
            voice: String::new(),
            speed: 1.0,
            model: String::new(),
            provider: TtsProvider::Google,
            base_url: GOOGLE_TTS_URL.to_string(),
        }
    }

    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: String, voice: String, speed: f32, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            speed,
            model,
            provider: TtsProvider::OpenAI,
            base_url: OPENAI_BASE_URL.to_string(),
        })
    }

    /// Create a new TTS instance using ElevenLabs
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs(api_key: String, voice_id: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice: voice_id,
            speed: 1.0, // ElevenLabs doesn't use speed in the same way
            model,
            provider: TtsProvider::ElevenLabs,
            base_url: ELEVENLABS_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API base (proxies, tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Provider in use
    #[must_use]
    pub const fn provider(&self) -> TtsProvider {
        self.provider
    }

    /// Synthesize text to speech
    ///
    /// # Arguments
    ///
    /// * `text` - Text to synthesize
    /// * `lang` - ISO 639-1 language of the text (e.g. "en", "hi")
    ///
    /// Only the Google voice uses `lang`. `OpenAI` and `ElevenLabs` detect the
    /// language from the text itself.
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(Error::Tts("no text to speak".to_string()));
        }

        tracing::debug!(provider = ?self.provider, lang, chars = text.len(), "synthesizing");

        match self.provider {
            TtsProvider::Google => self.synthesize_google(text, lang).await,
            TtsProvider::OpenAI => self.synthesize_openai(text).await,
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text).await,
        }
    }

    /// Synthesize using the Google Translate voice
    async fn synthesize_google(&self, text: &str, lang: &str) -> Result<Vec<u8>> {
        let chunks = split_text(text, GOOGLE_MAX_CHARS);
        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();

            let response = self
                .client
                .get(&self.base_url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", lang),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Tts(format!("Google TTS error {status}: {body}")));
            }

            audio.extend_from_slice(&response.bytes().await?);
        }

        tracing::debug!(chunks = chunks.len(), bytes = audio.len(), "Google TTS complete");
        Ok(audio)
    }

    /// Synthesize using OpenAI TTS
    ///
    /// The model picks the language from the text; there is no language field.
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
            response_format: &'a str,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// Synthesize using ElevenLabs TTS
    ///
    /// Multilingual models detect the language from the text.
    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("{}/text-to-speech/{}", self.base_url, self.voice);

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

/// Split text into chunks of at most `max_chars` characters
///
/// Breaks on whitespace; a single word longer than `max_chars` is cut
/// on character boundaries.
#[must_use]
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }

        let needed = if current.is_empty() { word_len } else { word_len + 1 };
        if current_len + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_short_text_is_one_chunk() {
        assert_eq!(split_text("The answer is:", 100), vec!["The answer is:"]);
    }

    #[test]
    fn test_split_respects_limit_and_words() {
        let text = "Our bank operates from 9 AM to 5 PM, Monday to Friday. On Saturdays, we are open from 9 AM to 1 PM.";
        let chunks = split_text(text, 40);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40, "chunk too long: {chunk}");
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_split_counts_characters_not_bytes() {
        // Devanagari is three bytes per char in UTF-8
        let text = "नमस्ते ".repeat(20);
        for chunk in split_text(&text, 100) {
            assert!(chunk.chars().count() <= 100);
        }
    }

    #[test]
    fn test_split_long_word() {
        let chunks = split_text(&"a".repeat(250), 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 50);
    }

    #[tokio::test]
    async fn test_google_requests_each_chunk() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(mockito::Matcher::UrlEncoded("tl".into(), "hi".into()))
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(b"mp3")
            .expect(2)
            .create_async()
            .await;

        let tts = TextToSpeech::new_google().with_base_url(server.url());
        let text = format!("{} {}", "क".repeat(90), "ख".repeat(90));
        let audio = tts.synthesize(&text, "hi").await.unwrap();

        mock.assert_async().await;
        assert_eq!(audio, b"mp3mp3");
    }

    #[tokio::test]
    async fn test_openai_error_mentions_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/audio/speech")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let tts = TextToSpeech::new_openai("key".into(), "alloy".into(), 1.0, "tts-1".into())
            .unwrap()
            .with_base_url(server.url());
        let err = tts.synthesize("hello", "en").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_openai_sends_text_without_language() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/audio/speech")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "model": "tts-1",
                "input": "नमस्ते",
                "voice": "alloy",
                "speed": 1.0,
                "response_format": "mp3"
            })))
            .with_status(200)
            .with_body(b"mp3")
            .create_async()
            .await;

        let tts = TextToSpeech::new_openai("key".into(), "alloy".into(), 1.0, "tts-1".into())
            .unwrap()
            .with_base_url(server.url());
        let audio = tts.synthesize("नमस्ते", "hi").await.unwrap();

        mock.assert_async().await;
        assert_eq!(audio, b"mp3");
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let tts = TextToSpeech::new_google();
        assert!(matches!(tts.synthesize("   ", "en").await, Err(Error::Tts(_))));
    }
}
