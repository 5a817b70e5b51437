//! Streamed completions from a generative model.

use std::io::{BufRead, BufReader};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{RAGError, Result};

pub trait Generator {
    fn stream(&self, prompt: &str) -> Result<AnswerStream>;
}

impl<G: Generator + ?Sized> Generator for &G {
    fn stream(&self, prompt: &str) -> Result<AnswerStream> {
        (**self).stream(prompt)
    }
}

/// Blocking client for the Ollama `/api/chat` endpoint with streaming on.
#[derive(Clone)]
pub struct OllamaGenerator {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Generator for OllamaGenerator {
    fn stream(&self, prompt: &str) -> Result<AnswerStream> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: true,
        };
        let resp = self.client.post(&self.endpoint).json(&body).send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RAGError::Generation(format!(
                "{} returned {}: {}",
                self.endpoint, status, text
            )));
        }
        log::debug!("streaming answer from {}", self.model);
        Ok(AnswerStream::new(BufReader::new(resp)))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Streaming,
    Complete,
    Failed,
}

/// Pull-based sequence of answer fragments read from newline-delimited JSON.
///
/// Each `next()` blocks until the model emits a fragment. The stream ends
/// when the model reports `done` or the body ends, and yields nothing after
/// an error. It cannot be restarted.
pub struct AnswerStream {
    reader: Box<dyn BufRead + Send>,
    state: StreamState,
    line: String,
}

impl AnswerStream {
    pub fn new(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            state: StreamState::Streaming,
            line: String::new(),
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Drains the stream into one string.
    pub fn collect_text(self) -> Result<String> {
        self.collect()
    }

    fn fail(&mut self, err: RAGError) -> Option<Result<String>> {
        self.state = StreamState::Failed;
        Some(Err(err))
    }
}

impl Iterator for AnswerStream {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.state == StreamState::Streaming {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => {
                    self.state = StreamState::Complete;
                    return None;
                }
                Ok(_) => {}
                Err(e) => return self.fail(e.into()),
            }

            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            let chunk: ChatChunk = match serde_json::from_str(line) {
                Ok(c) => c,
                Err(e) => return self.fail(e.into()),
            };
            if let Some(err) = chunk.error {
                return self.fail(RAGError::Generation(err));
            }
            if chunk.done {
                self.state = StreamState::Complete;
            }
            if let Some(msg) = chunk.message {
                if !msg.content.is_empty() {
                    return Some(Ok(msg.content));
                }
            }
        }
        None
    }
}
