//! Dhwani - voice-driven banking FAQ assistant
//!
//! Listens to a spoken question, matches it against a fixed table of
//! banking FAQ entries, speaks the answer in English and again in Hindi.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌───────────┐   ┌──────────────┐
//! │ Microphone   │──►│ STT service │──►│ FAQ table │──►│ TTS + speaker│
//! │ (cpal)       │   │ DG/Whisper  │   │ exact     │   │ en, then hi  │
//! └──────────────┘   └─────────────┘   └─────┬─────┘   └──────▲───────┘
//!                                            │                │
//!                                            └──► Translator ─┘
//! ```

pub mod assistant;
pub mod config;
pub mod error;
pub mod faq;
pub mod preflight;
pub mod translate;
pub mod voice;

pub use assistant::{Assistant, AssistantConfig, Listener, Recognition, Reply, Speaker};
pub use config::Config;
pub use error::{Error, Result};
pub use faq::{FALLBACK_ANSWER, FaqEntry, FaqTable};
pub use translate::{GoogleTranslator, Translator};
