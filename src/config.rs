//! Run configuration.
//!
//! Built once at process start from flags, `DOCRAG_*` environment variables
//! (optionally loaded from a `.env` file) and defaults, then passed to
//! [`crate::pipeline::Pipeline`] explicitly.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::{RAGError, Result};
use crate::indexing::SearchType;
use crate::mmr::{DEFAULT_FETCH_K, DEFAULT_LAMBDA};

pub const DEFAULT_DOCUMENT: &str = "rag-dataset/EasyPoint_Chatbot.pdf";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_GENERATIVE_MODEL: &str = "mistral";
pub const DEFAULT_CONVERTER: &str = "markitdown {input}";
pub const DEFAULT_QUESTION: &str = "What is EasyPoint?";
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_HEADER_LEVELS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchKind {
    Similarity,
    Mmr,
}

/// Where segment and query embeddings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// The `/api/embed` endpoint of the Ollama server
    Ollama,
    /// fastembed in process, needs the `local-embeddings` feature
    Local,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "docrag",
    about = "Answer questions about one document with retrieval-augmented generation",
    version
)]
pub struct Config {
    /// Document to convert, index and query
    #[arg(long, env = "DOCRAG_DOCUMENT", default_value = DEFAULT_DOCUMENT)]
    pub document_path: PathBuf,

    /// Base URL of the Ollama server used for embeddings and generation
    #[arg(long, env = "DOCRAG_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub model_endpoint: String,

    /// Embedding backend
    #[arg(long, env = "DOCRAG_EMBEDDER", value_enum, default_value_t = EmbedderKind::Ollama)]
    pub embedder: EmbedderKind,

    /// Embedding model served by the endpoint
    #[arg(long, env = "DOCRAG_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Generative model served by the endpoint
    #[arg(long, env = "DOCRAG_GENERATIVE_MODEL", default_value = DEFAULT_GENERATIVE_MODEL)]
    pub generative_model: String,

    /// Number of segments handed to the model as context
    #[arg(long, env = "DOCRAG_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Retrieval strategy
    #[arg(long, env = "DOCRAG_SEARCH_TYPE", value_enum, default_value_t = SearchKind::Mmr)]
    pub search_type: SearchKind,

    /// Nearest neighbours fetched before MMR reranking
    #[arg(long, env = "DOCRAG_FETCH_K", default_value_t = DEFAULT_FETCH_K)]
    pub fetch_k: usize,

    /// MMR balance, 1.0 is pure relevance and 0.0 pure diversity
    #[arg(long, env = "DOCRAG_LAMBDA", default_value_t = DEFAULT_LAMBDA)]
    pub lambda_mult: f32,

    /// Converter command line; `{input}` is replaced by the document path
    #[arg(long, env = "DOCRAG_CONVERTER", default_value = DEFAULT_CONVERTER)]
    pub converter: String,

    /// Deepest markdown header level that starts a new segment
    #[arg(long, env = "DOCRAG_HEADER_LEVELS", default_value_t = DEFAULT_HEADER_LEVELS)]
    pub header_levels: usize,

    /// Question to answer; repeat the flag to ask several
    #[arg(long = "question", default_value = DEFAULT_QUESTION)]
    pub questions: Vec<String>,

    /// Print the filled prompt instead of calling the generative model
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            document_path: PathBuf::from(DEFAULT_DOCUMENT),
            model_endpoint: DEFAULT_ENDPOINT.to_string(),
            embedder: EmbedderKind::Ollama,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generative_model: DEFAULT_GENERATIVE_MODEL.to_string(),
            top_k: DEFAULT_TOP_K,
            search_type: SearchKind::Mmr,
            fetch_k: DEFAULT_FETCH_K,
            lambda_mult: DEFAULT_LAMBDA,
            converter: DEFAULT_CONVERTER.to_string(),
            header_levels: DEFAULT_HEADER_LEVELS,
            questions: vec![DEFAULT_QUESTION.to_string()],
            dry_run: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RAGError::Config("top_k must be at least 1".to_string()));
        }
        if self.search_type == SearchKind::Mmr && self.fetch_k < self.top_k {
            return Err(RAGError::Config(format!(
                "fetch_k ({}) must not be smaller than top_k ({})",
                self.fetch_k, self.top_k
            )));
        }
        if !(0.0..=1.0).contains(&self.lambda_mult) {
            return Err(RAGError::Config(format!(
                "lambda_mult must be within [0, 1], got {}",
                self.lambda_mult
            )));
        }
        if !(1..=6).contains(&self.header_levels) {
            return Err(RAGError::Config(format!(
                "header_levels must be within 1..=6, got {}",
                self.header_levels
            )));
        }
        if self.converter.trim().is_empty() {
            return Err(RAGError::Config("converter command is empty".to_string()));
        }
        if self.questions.is_empty() {
            return Err(RAGError::Config("no question given".to_string()));
        }
        if self.embedder == EmbedderKind::Local && !cfg!(feature = "local-embeddings") {
            return Err(RAGError::Config(
                "the local embedder is not compiled in, rebuild with --features local-embeddings"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn search(&self) -> SearchType {
        match self.search_type {
            SearchKind::Similarity => SearchType::Similarity,
            SearchKind::Mmr => SearchType::Mmr {
                fetch_k: self.fetch_k,
                lambda_mult: self.lambda_mult,
            },
        }
    }
}
