//! Conversation loop
//!
//! ```text
//! intro ─► listen ─► match ─► speak (en) ─► translate ─► speak (hi)
//!            ▲                                              │
//!            └──────────── "yes" ◄── confirm-continue ◄─────┘
//! ```
//!
//! Every stage runs to completion before the next one starts. Failures are
//! printed and the loop keeps going; only a non-affirmative answer to the
//! continue prompt ends it.

use async_trait::async_trait;

use crate::Result;
use crate::faq::{FALLBACK_ANSWER, FaqTable};
use crate::translate::Translator;

/// Outcome of one listen-and-recognize attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    /// Speech was transcribed
    Transcript(String),
    /// Audio was captured but nothing intelligible came back
    Unintelligible,
    /// The recognition service could not be reached
    Unavailable(String),
}

impl Recognition {
    /// Classify a transcription result
    ///
    /// Empty transcripts count as unintelligible; transport failures as
    /// unavailable.
    #[must_use]
    pub fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(text) if text.trim().is_empty() => Self::Unintelligible,
            Ok(text) => Self::Transcript(text),
            Err(e) => {
                tracing::warn!(error = %e, "speech recognition failed");
                Self::Unavailable(e.to_string())
            }
        }
    }

    /// Transcript text, if any
    #[must_use]
    pub fn transcript(&self) -> Option<&str> {
        match self {
            Self::Transcript(text) => Some(text),
            _ => None,
        }
    }

    /// User-facing error message, if recognition failed
    #[must_use]
    pub const fn error_message(&self) -> Option<&'static str> {
        match self {
            Self::Transcript(_) => None,
            Self::Unintelligible => Some("Unable to recognize speech"),
            Self::Unavailable(_) => Some("API unavailable"),
        }
    }
}

/// Listens for one spoken utterance and transcribes it
#[async_trait(?Send)]
pub trait Listener {
    /// Capture and recognize one utterance
    async fn listen(&mut self) -> Recognition;
}

/// Speaks text aloud in a given language
#[async_trait(?Send)]
pub trait Speaker {
    /// Synthesize and play `text` in `lang` (ISO 639-1)
    async fn speak(&mut self, text: &str, lang: &str) -> Result<()>;
}

/// Phrases and languages used by the conversation
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Greeting spoken at startup
    pub introduction: String,
    /// Prompt printed before each question
    pub question_prompt: String,
    /// Phrase spoken before the answer
    pub announcement: String,
    /// Prompt printed before the continue check
    pub continue_prompt: String,
    /// Word that keeps the conversation going
    pub affirmative: String,
    /// Language of questions and answers
    pub source_lang: String,
    /// Language of the translated answer
    pub target_lang: String,
    /// Speak the English answer before the translation
    pub speak_source_answer: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            introduction: "Hi, I am Dhwani, an AI chatbot assistant that handles your banking problems and I am created by team L-MAC. Tell me, how can I help you?".to_string(),
            question_prompt: "Ask a question in English:".to_string(),
            announcement: "The answer is:".to_string(),
            continue_prompt: "Do you want to ask another question? (yes/no)".to_string(),
            affirmative: "yes".to_string(),
            source_lang: "en".to_string(),
            target_lang: "hi".to_string(),
            speak_source_answer: true,
        }
    }
}

/// Result of answering a single question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Answer in the source language
    pub answer: String,
    /// Answer in the target language, if translation succeeded
    pub translated: Option<String>,
}

/// Voice FAQ assistant
pub struct Assistant<L, T, S> {
    faq: FaqTable,
    config: AssistantConfig,
    listener: L,
    translator: T,
    speaker: S,
}

impl<L, T, S> Assistant<L, T, S>
where
    L: Listener,
    T: Translator,
    S: Speaker,
{
    /// Create an assistant
    pub const fn new(
        faq: FaqTable,
        config: AssistantConfig,
        listener: L,
        translator: T,
        speaker: S,
    ) -> Self {
        Self {
            faq,
            config,
            listener,
            translator,
            speaker,
        }
    }

    /// FAQ table in use
    #[must_use]
    pub const fn faq(&self) -> &FaqTable {
        &self.faq
    }

    /// Run the conversation until the user declines to continue
    pub async fn run(&mut self) {
        println!("{}", self.config.introduction);
        let intro = self.config.introduction.clone();
        let lang = self.config.source_lang.clone();
        self.say(&intro, &lang).await;

        let mut turns = 0usize;
        loop {
            println!("\n{}", self.config.question_prompt);
            let question = self.listen().await;

            if let Some(text) = question.transcript() {
                println!("You said: {text}");
                self.handle_question(text).await;
                turns += 1;
            } else if let Some(message) = question.error_message() {
                println!("Error: {message}");
            }

            println!("{}", self.config.continue_prompt);
            let reply = self.listen().await;

            match reply.transcript() {
                Some(text) if self.is_affirmative(text) => {}
                Some(_) => {
                    println!("Exiting the assistant.");
                    break;
                }
                None => {
                    println!(
                        "Sorry, I didn't catch that. Please say '{}' to continue or 'no' to exit.",
                        self.config.affirmative
                    );
                }
            }
        }

        tracing::info!(turns, "conversation ended");
    }

    /// Answer one question: look it up, speak it, translate it, speak again
    pub async fn handle_question(&mut self, question: &str) -> Reply {
        let matched = self.faq.lookup(question);
        tracing::info!(question, matched = matched.is_some(), "answering");
        let answer = matched.unwrap_or(FALLBACK_ANSWER).to_string();
        println!("Answer: {answer}");

        let source = self.config.source_lang.clone();
        let target = self.config.target_lang.clone();

        let announcement = self.config.announcement.clone();
        println!("{announcement}");
        self.say(&announcement, &source).await;

        if self.config.speak_source_answer {
            self.say(&answer, &source).await;
        }

        let translated = match self.translator.translate(&answer, &source, &target).await {
            Ok(text) => {
                println!("Translated to Hindi: {text}");
                self.say(&text, &target).await;
                Some(text)
            }
            Err(e) => {
                tracing::warn!(translator = self.translator.name(), error = %e, "translation failed");
                println!("Error: {e}");
                None
            }
        };

        Reply { answer, translated }
    }

    /// Whether a continue response keeps the conversation going
    #[must_use]
    pub fn is_affirmative(&self, response: &str) -> bool {
        response.to_lowercase() == self.config.affirmative.to_lowercase()
    }

    async fn listen(&mut self) -> Recognition {
        println!("Listening...");
        let recognition = self.listener.listen().await;
        tracing::debug!(?recognition, "recognized");
        recognition
    }

    /// Speak, reporting rather than propagating failures
    async fn say(&mut self, text: &str, lang: &str) {
        if let Err(e) = self.speaker.speak(text, lang).await {
            tracing::error!(lang, error = %e, "speech output failed");
            println!("Error: {e}");
        }
    }
}
