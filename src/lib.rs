//! Retrieval-augmented question answering over a single document.
//!
//! The run is a fixed sequence: convert the document to markdown-like text,
//! split it at headers, embed the segments into a flat L2 index, then answer
//! each question from the segments retrieved for it.

pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod indexing;
pub mod mmr;
pub mod pipeline;

pub use answer::{PROMPT_TEMPLATE, RagChain, format_segments, render_prompt};
pub use chunking::{Header, MarkdownHeaderSplitter, Segment, SegmentID, SplitConfig};
pub use config::{Config, EmbedderKind, SearchKind};
pub use document::{
    CommandConverter, Converter, Document, DocumentID, PassthroughConverter, load_document,
    outline_pages,
};
pub use embedding::{Embedder, HashEmbedder, OllamaEmbedder};
#[cfg(feature = "local-embeddings")]
pub use embedding::FastEmbedder;
pub use error::{RAGError, Result};
pub use generation::{AnswerStream, Generator, OllamaGenerator, StreamState};
pub use indexing::{
    DIMENSION_SAMPLE, EMBED_BATCH_SIZE, FlatL2Index, Retriever, SearchType, VectorStore,
};
pub use pipeline::Pipeline;
