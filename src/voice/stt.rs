//! Speech-to-text (STT) processing
//!
//! Transcripts come back as plain lower-case words with no punctuation, the
//! form the FAQ table and the continue prompt match against.

use crate::{Error, Result};

/// Default `OpenAI` API base
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Deepgram API base
pub const DEEPGRAM_BASE_URL: &str = "https://api.deepgram.com/v1";

/// Style sample sent to Whisper so it leans towards plain transcripts
pub const WHISPER_STYLE_PROMPT: &str =
    "yes no what are the bank working hours how can i check my account balance";

/// Non-ASCII punctuation dropped from transcripts
const SENTENCE_MARKS: &[char] = &['“', '”', '‘', '…', '¿', '¡', '।', '॥'];

/// Response from OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from Deepgram transcription API
#[derive(serde::Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(serde::Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(serde::Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(serde::Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// STT provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SttProvider {
    /// `OpenAI` Whisper
    Whisper,
    /// Deepgram
    Deepgram,
}

impl SttProvider {
    /// Parse a provider name
    ///
    /// # Errors
    ///
    /// Returns error for unknown names
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "whisper" | "openai" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("unknown STT provider: {other}"))),
        }
    }

    /// Default model for the provider
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Whisper => "whisper-1",
            Self::Deepgram => "nova-2",
        }
    }
}

/// Transcribes speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
    language: String,
    provider: SttProvider,
    base_url: String,
}

impl SpeechToText {
    /// Create a new STT instance using `OpenAI` Whisper
    ///
    /// `language` is a BCP-47 tag such as `en-US`.
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_whisper(api_key: String, model: String, language: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            language,
            provider: SttProvider::Whisper,
            base_url: OPENAI_BASE_URL.to_string(),
        })
    }

    /// Create a new STT instance using Deepgram
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_deepgram(api_key: String, model: String, language: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Deepgram API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            language,
            provider: SttProvider::Deepgram,
            base_url: DEEPGRAM_BASE_URL.to_string(),
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
    pub const fn provider(&self) -> SttProvider {
        self.provider
    }

    /// Transcribe audio to text
    ///
    /// # Arguments
    ///
    /// * `audio` - WAV audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        match self.provider {
            SttProvider::Whisper => self.transcribe_whisper(audio).await,
            SttProvider::Deepgram => self.transcribe_deepgram(audio).await,
        }
    }

    /// Transcribe using OpenAI Whisper
    async fn transcribe_whisper(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        // Whisper takes ISO-639-1, so "en-US" becomes "en"
        let language = self
            .language
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("language", language)
            .text("prompt", WHISPER_STYLE_PROMPT);

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            e
        })?;

        let transcript = plain_transcript(&result.text);
        tracing::info!(raw = %result.text, transcript = %transcript, "transcription complete");
        Ok(transcript)
    }

    /// Transcribe using Deepgram
    async fn transcribe_deepgram(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Deepgram transcription");

        let response = self
            .client
            .post(format!("{}/listen", self.base_url))
            .query(&[
                ("model", self.model.as_str()),
                ("language", self.language.as_str()),
                ("punctuate", "false"),
                ("smart_format", "false"),
            ])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Deepgram request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let result: DeepgramResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Deepgram response");
            e
        })?;

        let transcript = result
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| plain_transcript(&a.transcript))
            .unwrap_or_default();

        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}

/// Reduce a transcript to lower-case words separated by single spaces
///
/// Sentence punctuation is dropped, hyphens and slashes split words, and
/// apostrophes are kept so "don't" stays one word.
#[must_use]
pub fn plain_transcript(text: &str) -> String {
    let spaced: String = text
        .chars()
        .filter_map(|c| match c {
            '\'' | '’' => Some('\''),
            c if c.is_whitespace() || c == '-' || c == '/' => Some(' '),
            c if c.is_ascii_punctuation() || SENTENCE_MARKS.contains(&c) => None,
            c => Some(c),
        })
        .collect();

    spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_rejected() {
        let result = SpeechToText::new_whisper(String::new(), "whisper-1".into(), "en-US".into());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(SttProvider::parse("Deepgram").unwrap(), SttProvider::Deepgram);
        assert_eq!(SttProvider::parse("openai").unwrap(), SttProvider::Whisper);
        assert!(SttProvider::parse("google").is_err());
    }

    #[tokio::test]
    async fn test_whisper_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/audio/transcriptions")
            .match_header("Authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text": "what are the bank working hours"}"#)
            .create_async()
            .await;

        let stt = SpeechToText::new_whisper("test-key".into(), "whisper-1".into(), "en-US".into())
            .unwrap()
            .with_base_url(server.url());
        let text = stt.transcribe(&[0u8; 64]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "what are the bank working hours");
    }

    #[test]
    fn test_plain_transcript() {
        assert_eq!(
            plain_transcript("What are the bank working hours?"),
            "what are the bank working hours"
        );
        assert_eq!(plain_transcript("Yes."), "yes");
        assert_eq!(
            plain_transcript("  How can I change my ATM PIN?! "),
            "how can i change my atm pin"
        );
        assert_eq!(plain_transcript("I don’t know, sorry"), "i don't know sorry");
        assert_eq!(plain_transcript("e-mail / SMS"), "e mail sms");
        assert_eq!(plain_transcript("नमस्ते।"), "नमस्ते");
    }

    #[tokio::test]
    async fn test_whisper_punctuated_reply_is_plain() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/audio/transcriptions")
            .match_body(mockito::Matcher::Regex(r#"name="prompt""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text": "What are the bank working hours?"}"#)
            .create_async()
            .await;

        let stt = SpeechToText::new_whisper("test-key".into(), "whisper-1".into(), "en-US".into())
            .unwrap()
            .with_base_url(server.url());
        let text = stt.transcribe(&[0u8; 64]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "what are the bank working hours");
        assert_ne!(crate::FaqTable::builtin().answer(&text), crate::FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_whisper_error_mentions_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/audio/transcriptions")
            .with_status(401)
            .with_body(r#"{"error": "Invalid API key"}"#)
            .create_async()
            .await;

        let stt = SpeechToText::new_whisper("bad".into(), "whisper-1".into(), "en-US".into())
            .unwrap()
            .with_base_url(server.url());
        let err = stt.transcribe(&[0u8; 64]).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_deepgram_empty_alternatives() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/listen")
            .match_query(mockito::Matcher::UrlEncoded(
                "language".into(),
                "en-US".into(),
            ))
            .match_header("Authorization", "Token dg-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results": {"channels": [{"alternatives": []}]}}"#)
            .create_async()
            .await;

        let stt = SpeechToText::new_deepgram("dg-key".into(), "nova-2".into(), "en-US".into())
            .unwrap()
            .with_base_url(server.url());
        let text = stt.transcribe(&[0u8; 64]).await.unwrap();

        mock.assert_async().await;
        assert!(text.is_empty());
    }
}
