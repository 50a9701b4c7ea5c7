//! Text translation
//!
//! The answer is translated from English to Hindi before the second spoken
//! reply. [`GoogleTranslator`] talks to the public `translate_a/single`
//! endpoint, the same one browser extensions use.

use async_trait::async_trait;
use serde_json::Value;

use crate::{Error, Result};

/// Default translation endpoint
pub const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Translates text between languages
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from language `from` to language `to` (ISO 639-1 codes)
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String>;

    /// Translator name for logging
    fn name(&self) -> &str;
}

/// Google Translate web client
pub struct GoogleTranslator {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslator {
    /// Create a translator against the public endpoint
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(GOOGLE_TRANSLATE_URL)
    }

    /// Create a translator against a custom endpoint
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for GoogleTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        tracing::debug!(from, to, chars = text.len(), "translating");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("client", "gtx"),
                ("sl", from),
                ("tl", to),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "translation request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "translation API error");
            return Err(Error::Translation(format!(
                "Google Translate error {status}: {body}"
            )));
        }

        let body: Value = response.json().await?;
        let translated = parse_translation(&body)?;

        tracing::info!(to, translated = %translated, "translation complete");
        Ok(translated)
    }

    fn name(&self) -> &str {
        "google"
    }
}

/// Extract translated text from a `translate_a/single` response
///
/// The body is `[[["seg1", "src1", ...], ["seg2", "src2", ...]], ...]`; the
/// translation is the concatenation of each segment's first string.
///
/// # Errors
///
/// Returns error if the body does not have the expected shape
pub fn parse_translation(body: &Value) -> Result<String> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Translation("unexpected response shape".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(Error::Translation("empty translation".to_string()));
    }

    Ok(translated)
}
