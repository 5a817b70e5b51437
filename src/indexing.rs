use std::collections::HashMap;

use indicatif::{ProgressBar, ProgressStyle};

use crate::chunking::{Segment, SegmentID};
use crate::embedding::Embedder;
use crate::error::{RAGError, Result};
use crate::mmr::{self, DEFAULT_FETCH_K, DEFAULT_LAMBDA};

/// Text embedded once to learn the model's dimensionality.
pub const DIMENSION_SAMPLE: &str = "this is some text data";

/// Segments sent to the embedder per request.
pub const EMBED_BATCH_SIZE: usize = 32;

/// Exact nearest-neighbour index over squared L2 distance.
pub struct FlatL2Index {
    dim: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Appends all vectors or none of them.
    pub fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(RAGError::DimensionMismatch {
                expected: self.dim,
                got: bad.len(),
            });
        }
        self.vectors.extend(vectors);
        Ok(())
    }

    /// Up to `k` `(position, squared distance)` pairs, nearest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dim {
            return Err(RAGError::DimensionMismatch {
                expected: self.dim,
                got: query.len(),
            });
        }
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    pub fn reconstruct(&self, position: usize) -> Result<&[f32]> {
        self.vectors
            .get(position)
            .map(Vec::as_slice)
            .ok_or(RAGError::InvalidIndex(position))
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchType {
    Similarity,
    Mmr { fetch_k: usize, lambda_mult: f32 },
}

impl Default for SearchType {
    fn default() -> Self {
        SearchType::Mmr {
            fetch_k: DEFAULT_FETCH_K,
            lambda_mult: DEFAULT_LAMBDA,
        }
    }
}

/// Flat index plus an in-memory docstore keyed by segment id.
pub struct VectorStore<E: Embedder> {
    embedder: E,
    index: FlatL2Index,
    docstore: HashMap<SegmentID, Segment>,
    index_to_id: Vec<SegmentID>,
}

impl<E: Embedder> VectorStore<E> {
    /// Embeds [`DIMENSION_SAMPLE`] and sizes an empty index to the result.
    pub fn new(embedder: E) -> Result<Self> {
        let sample = embedder.embed(DIMENSION_SAMPLE)?;
        if sample.is_empty() {
            return Err(RAGError::EmptyEmbeddings);
        }
        log::info!("embedding dimensionality is {}", sample.len());

        Ok(Self {
            embedder,
            index: FlatL2Index::new(sample.len()),
            docstore: HashMap::new(),
            index_to_id: Vec::new(),
        })
    }

    pub fn from_segments(embedder: E, segments: Vec<Segment>) -> Result<Self> {
        let mut store = Self::new(embedder)?;
        store.add_segments(segments)?;
        Ok(store)
    }

    /// Embeds and inserts every segment. Nothing is inserted on error.
    pub fn add_segments(&mut self, segments: Vec<Segment>) -> Result<Vec<SegmentID>> {
        let bar = ProgressBar::new(segments.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("embedding {bar:40} {pos}/{len} segments")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let contents: Vec<&str> = segments.iter().map(Segment::content).collect();
        let mut vectors = Vec::with_capacity(segments.len());
        for batch in contents.chunks(EMBED_BATCH_SIZE) {
            let embedded = match self.embed_checked(batch) {
                Ok(embedded) => embedded,
                Err(e) => {
                    bar.abandon();
                    return Err(e);
                }
            };
            vectors.extend(embedded);
            bar.inc(batch.len() as u64);
        }
        bar.finish_and_clear();

        self.index.add(vectors)?;

        let ids: Vec<SegmentID> = segments.iter().map(|s| s.id).collect();
        self.index_to_id.extend(ids.iter().copied());
        for segment in segments {
            self.docstore.insert(segment.id, segment);
        }
        log::info!("indexed {} segments", ids.len());
        Ok(ids)
    }

    fn embed_checked(&self, batch: &[&str]) -> Result<Vec<Vec<f32>>> {
        let embedded = self.embedder.embed_batch(batch)?;
        if embedded.len() != batch.len() {
            return Err(RAGError::Embedding(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                embedded.len()
            )));
        }
        if let Some(bad) = embedded.iter().find(|v| v.len() != self.index.dim()) {
            return Err(RAGError::DimensionMismatch {
                expected: self.index.dim(),
                got: bad.len(),
            });
        }
        Ok(embedded)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.index.dim()
    }

    pub fn get(&self, id: &SegmentID) -> Option<&Segment> {
        self.docstore.get(id)
    }

    fn segment_at(&self, position: usize) -> Result<&Segment> {
        self.index_to_id
            .get(position)
            .and_then(|id| self.docstore.get(id))
            .ok_or(RAGError::InvalidIndex(position))
    }

    /// Plain nearest neighbours with their squared L2 distance.
    pub fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<(&Segment, f32)>> {
        let q = self.embedder.embed(query)?;
        self.index
            .search(&q, k)?
            .into_iter()
            .map(|(pos, dist)| self.segment_at(pos).map(|s| (s, dist)))
            .collect()
    }

    /// Fetches `fetch_k` nearest neighbours and reranks them with MMR.
    pub fn max_marginal_relevance_search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
        lambda_mult: f32,
    ) -> Result<Vec<&Segment>> {
        let q = self.embedder.embed(query)?;
        let fetched = self.index.search(&q, fetch_k.max(k))?;

        let candidates = fetched
            .iter()
            .map(|(pos, _)| self.index.reconstruct(*pos).map(<[f32]>::to_vec))
            .collect::<Result<Vec<_>>>()?;

        let picked = mmr::maximal_marginal_relevance(&q, &candidates, k, lambda_mult);
        log::debug!(
            "mmr picked {:?} out of {} candidates",
            picked,
            candidates.len()
        );

        picked
            .into_iter()
            .map(|i| self.segment_at(fetched[i].0))
            .collect()
    }

    pub fn as_retriever(&self, search_type: SearchType, k: usize) -> Retriever<'_, E> {
        Retriever {
            store: self,
            search_type,
            k,
        }
    }
}

/// A store bound to one search strategy and result count.
pub struct Retriever<'a, E: Embedder> {
    store: &'a VectorStore<E>,
    search_type: SearchType,
    k: usize,
}

impl<'a, E: Embedder> Retriever<'a, E> {
    pub fn retrieve(&self, query: &str) -> Result<Vec<&'a Segment>> {
        match self.search_type {
            SearchType::Similarity => Ok(self
                .store
                .similarity_search(query, self.k)?
                .into_iter()
                .map(|(s, _)| s)
                .collect()),
            SearchType::Mmr {
                fetch_k,
                lambda_mult,
            } => self
                .store
                .max_marginal_relevance_search(query, self.k, fetch_k, lambda_mult),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }
}
