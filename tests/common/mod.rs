//! Shared test doubles for the conversation seams

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use dhwani::{Error, Listener, Recognition, Result, Speaker, Translator};

/// Listener that replays a fixed script, then declines to continue
pub struct ScriptedListener {
    script: VecDeque<Recognition>,
    pub heard: Rc<RefCell<usize>>,
}

impl ScriptedListener {
    pub fn new(script: Vec<Recognition>) -> Self {
        Self {
            script: script.into(),
            heard: Rc::new(RefCell::new(0)),
        }
    }
}

#[async_trait(?Send)]
impl Listener for ScriptedListener {
    async fn listen(&mut self) -> Recognition {
        *self.heard.borrow_mut() += 1;
        self.script
            .pop_front()
            .unwrap_or_else(|| Recognition::Transcript("no".to_string()))
    }
}

/// Speaker that records what it was asked to say
#[derive(Clone, Default)]
pub struct RecordingSpeaker {
    pub spoken: Rc<RefCell<Vec<(String, String)>>>,
    pub fail: bool,
}

impl RecordingSpeaker {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<(String, String)> {
        self.spoken.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Speaker for RecordingSpeaker {
    async fn speak(&mut self, text: &str, lang: &str) -> Result<()> {
        self.spoken
            .borrow_mut()
            .push((text.to_string(), lang.to_string()));
        if self.fail {
            return Err(Error::Audio("no output device".to_string()));
        }
        Ok(())
    }
}

/// Translator that tags text with the target language
pub struct TaggingTranslator {
    pub fail: bool,
}

#[async_trait]
impl Translator for TaggingTranslator {
    async fn translate(&self, text: &str, _from: &str, to: &str) -> Result<String> {
        if self.fail {
            return Err(Error::Translation("service down".to_string()));
        }
        Ok(format!("[{to}] {text}"))
    }

    fn name(&self) -> &str {
        "tagging"
    }
}
