//! Embedding backends.
//!
//! Every backend maps a text to a fixed-length `Vec<f32>`. The length is a
//! property of the model and is discovered by the vector store at startup.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use sha2::Digest;

use crate::error::{RAGError, Result};

pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }
}

/// Blocking client for the Ollama `/api/embed` endpoint.
///
/// No timeout and no retries: a stalled server stalls the caller.
#[derive(Clone)]
pub struct OllamaEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, input: &[&str]) -> Result<Vec<Vec<f32>>> {
        let body = EmbedRequest {
            model: &self.model,
            input,
        };
        let resp = self.client.post(&self.endpoint).json(&body).send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RAGError::Embedding(format!(
                "{} returned {}: {}",
                self.endpoint, status, text
            )));
        }
        let parsed: EmbedResponse = resp.json()?;
        if parsed.embeddings.len() != input.len() {
            log::error!(
                "{} returned {} embeddings for {} inputs",
                self.endpoint,
                parsed.embeddings.len(),
                input.len()
            );
            return Err(RAGError::EmptyEmbeddings);
        }
        Ok(parsed.embeddings)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text])?
            .into_iter()
            .next()
            .ok_or(RAGError::EmptyEmbeddings)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Deterministic embedder deriving unit vectors from SHA-256 digests.
///
/// Identical text always maps to the identical vector. Carries no semantics,
/// which makes it suitable for offline runs, tests and benchmarks.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    pub dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.dim == 0 {
            return Err(RAGError::EmptyEmbeddings);
        }
        let mut out = Vec::with_capacity(self.dim);
        let mut block = 0u32;
        while out.len() < self.dim {
            let mut hash = sha2::Sha256::new();
            hash.update(block.to_le_bytes());
            hash.update(text.as_bytes());
            let digest = hash.finalize();
            for pair in digest.chunks_exact(2) {
                if out.len() == self.dim {
                    break;
                }
                let raw = u16::from_le_bytes([pair[0], pair[1]]);
                out.push(raw as f32 / u16::MAX as f32 * 2.0 - 1.0);
            }
            block += 1;
        }
        let norm = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            out.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(out)
    }
}

#[cfg(feature = "local-embeddings")]
pub use local::FastEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use std::sync::Mutex;

    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

    use super::Embedder;
    use crate::error::{RAGError, Result};

    /// In-process embeddings through fastembed, an alternative to a running
    /// Ollama server.
    pub struct FastEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedder {
        pub fn new() -> Result<Self> {
            let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::NomicEmbedTextV15))
                .map_err(|e| RAGError::Embedding(format!("model init failed: {e}")))?;
            Ok(Self {
                model: Mutex::new(model),
            })
        }
    }

    impl Embedder for FastEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.embed_batch(&[text])?
                .into_iter()
                .next()
                .ok_or(RAGError::EmptyEmbeddings)
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            let mut model = self
                .model
                .lock()
                .map_err(|_| RAGError::Embedding("embedding model lock poisoned".to_string()))?;
            model
                .embed(texts.to_vec(), None)
                .map_err(|e| RAGError::Embedding(e.to_string()))
        }
    }
}
