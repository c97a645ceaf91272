//! Testing utilities including mock implementations.
//!
//! Useful for exercising the generation and refinement paths without real
//! model or network calls.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AdapterError, Result};
use crate::traits::{fetcher::PageFetcher, model::LanguageModel};

enum ScriptedResponse {
    Text(String),
    Error(String),
}

/// A mock language model returning scripted responses in order.
///
/// Records every prompt it receives for assertions about hint and
/// feedback threading.
#[derive(Default)]
pub struct MockModel {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    prompts: Mutex<Vec<String>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next response text.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(ScriptedResponse::Text(text.into()));
        self
    }

    /// Script a transport failure.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(ScriptedResponse::Error(message.into()));
        self
    }

    /// Every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of completions requested.
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        match self.responses.lock().unwrap().pop_front() {
            Some(ScriptedResponse::Text(text)) => Ok(text),
            Some(ScriptedResponse::Error(message)) => Err(AdapterError::Model(message.into())),
            None => Err(AdapterError::Model(
                "mock model has no scripted response".into(),
            )),
        }
    }
}

/// A mock page fetcher serving fixed markup.
#[derive(Default)]
pub struct MockFetcher {
    pages: Mutex<HashMap<String, String>>,
    fallback: Option<String>,
    fetched: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this markup for an exact URL.
    pub fn with_page(self, url: impl Into<String>, markup: impl Into<String>) -> Self {
        self.pages.lock().unwrap().insert(url.into(), markup.into());
        self
    }

    /// Serve this markup for any URL without an exact entry.
    pub fn with_fallback(mut self, markup: impl Into<String>) -> Self {
        self.fallback = Some(markup.into());
        self
    }

    /// URLs fetched so far.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetched.lock().unwrap().push(url.to_string());

        if let Some(markup) = self.pages.lock().unwrap().get(url) {
            return Ok(markup.clone());
        }
        match &self.fallback {
            Some(markup) => Ok(markup.clone()),
            None => Err(AdapterError::Fetch {
                url: url.to_string(),
                source: "no scripted page".into(),
            }),
        }
    }
}
