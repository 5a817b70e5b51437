use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RAGError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file at {path}: {source}")]
    FileRead { path: PathBuf, source: io::Error },

    #[error("Invalid UTF-8 in converter output for {path}")]
    InvalidUtf8 {
        path: PathBuf,
        #[source]
        source: simdutf8::basic::Utf8Error,
    },

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Converter `{program}` could not be started: {source}")]
    ConverterNotFound { program: String, source: io::Error },

    #[error("Conversion of {path} failed ({status}): {stderr}")]
    ConversionFailed {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Converter produced no text for {0}")]
    EmptyDocument(PathBuf),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Empty embeddings vector")]
    EmptyEmbeddings,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid index: {0}")]
    InvalidIndex(usize),

    #[error("No segments produced for document {path}")]
    NoSegments { path: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RAGError>;
