use std::io::Write;

use crate::answer::RagChain;
use crate::chunking::{MarkdownHeaderSplitter, SplitConfig};
use crate::config::Config;
use crate::document::{Converter, load_document};
use crate::embedding::Embedder;
use crate::error::{RAGError, Result};
use crate::generation::Generator;
use crate::indexing::VectorStore;

pub const SEPARATOR_WIDTH: usize = 50;

/// The external collaborators of one run.
pub struct Pipeline<C: Converter, E: Embedder, G: Generator> {
    pub converter: C,
    pub embedder: E,
    pub generator: G,
}

impl<C: Converter, E: Embedder, G: Generator> Pipeline<C, E, G> {
    pub fn new(converter: C, embedder: E, generator: G) -> Self {
        Self {
            converter,
            embedder,
            generator,
        }
    }

    /// Load, split, index, then answer every configured question into `out`.
    pub fn run(self, config: &Config, out: &mut impl Write) -> Result<()> {
        config.validate()?;

        let doc = load_document(&config.document_path, &self.converter)?;

        let splitter = MarkdownHeaderSplitter::new(SplitConfig::levels(config.header_levels));
        let segments = splitter.split_document(&doc);
        if segments.is_empty() {
            return Err(RAGError::NoSegments { path: doc.path });
        }

        let store = VectorStore::from_segments(self.embedder, segments)?;
        let retriever = store.as_retriever(config.search(), config.top_k);
        let chain = RagChain::new(retriever, self.generator);

        for question in &config.questions {
            writeln!(out, "Question: {question}")?;
            if config.dry_run {
                let prompt = chain.prompt_for(question)?;
                write!(out, "{prompt}")?;
            } else {
                for fragment in chain.stream(question)? {
                    write!(out, "{}", fragment?)?;
                    out.flush()?;
                }
            }
            write!(out, "\n{}\n\n", "-".repeat(SEPARATOR_WIDTH))?;
        }
        out.flush()?;
        Ok(())
    }
}
