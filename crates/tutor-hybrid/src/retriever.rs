use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use tutor_core::corpus::CorpusStore;
use tutor_core::levels::YearLevel;
use tutor_core::traits::{Embedder, VectorIndex};
use tutor_core::types::{Excerpt, Neighbor, ReconciliationPolicy};
use tutor_vector::FlatIndex;

use crate::error::RetrievalError;
use crate::filter::{filter, FilteredView};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which set of vectors a neighbour's position indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSpace {
    /// Offset into the filtered view; the index was built over the view only.
    FilteredView,
    /// Offset into the full corpus store; the index covers the whole corpus.
    FullStore,
}

enum Strategy {
    PerCallIndex,
    GlobalPostFilter { index: Arc<dyn VectorIndex>, candidate_multiplier: usize },
}

/// Outcome of [`HybridRetriever::retrieve`]: excerpts nearest first, plus the
/// failure that emptied them, if any.
#[derive(Debug, Default)]
pub struct Retrieval {
    pub excerpts: Vec<Excerpt>,
    pub diagnostic: Option<RetrievalError>,
}

/// Metadata filter followed by semantic ranking of the filtered chunks.
pub struct HybridRetriever {
    corpus: Arc<CorpusStore>,
    embedder: Result<Arc<dyn Embedder>, String>,
    strategy: Strategy,
    timeout: Duration,
}

impl HybridRetriever {
    /// Retriever that embeds and searches the filtered view on every call.
    pub fn new(corpus: Arc<CorpusStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { corpus, embedder: Ok(embedder), strategy: Strategy::PerCallIndex, timeout: DEFAULT_TIMEOUT }
    }

    /// Retriever whose embedder failed to load; every non-trivial retrieval
    /// reports `reason` as a configuration failure.
    pub fn without_embedder(corpus: Arc<CorpusStore>, reason: impl Into<String>) -> Self {
        Self { corpus, embedder: Err(reason.into()), strategy: Strategy::PerCallIndex, timeout: DEFAULT_TIMEOUT }
    }

    /// Search `index` (built over the whole corpus, in store order) and drop
    /// hits outside the filtered view. `top_k * candidate_multiplier`
    /// candidates are fetched before filtering.
    pub fn with_global_index(mut self, index: Arc<dyn VectorIndex>, candidate_multiplier: usize) -> Self {
        self.strategy = Strategy::GlobalPostFilter { index, candidate_multiplier: candidate_multiplier.max(1) };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn policy(&self) -> ReconciliationPolicy {
        match self.strategy {
            Strategy::PerCallIndex => ReconciliationPolicy::PerCallIndex,
            Strategy::GlobalPostFilter { .. } => ReconciliationPolicy::GlobalPostFilter,
        }
    }

    pub fn corpus(&self) -> &CorpusStore {
        &self.corpus
    }

    /// Like [`try_retrieve`](Self::try_retrieve), but failures become an empty
    /// result carrying the error as a diagnostic.
    pub async fn retrieve(&self, query: &str, area: &str, level: YearLevel, top_k: usize) -> Retrieval {
        match self.try_retrieve(query, area, level, top_k).await {
            Ok(excerpts) => Retrieval { excerpts, diagnostic: None },
            Err(e) => {
                warn!(error = %e, area, level = %level, "retrieval failed");
                Retrieval { excerpts: Vec::new(), diagnostic: Some(e) }
            }
        }
    }

    /// At most `top_k` excerpts from `area` at `level`, nearest to `query` first.
    pub async fn try_retrieve(&self, query: &str, area: &str, level: YearLevel, top_k: usize) -> Result<Vec<Excerpt>, RetrievalError> {
        let start = Instant::now();
        let view = filter(&self.corpus, area, level);
        if view.is_empty() || top_k == 0 {
            debug!(area, level = %level, top_k, "nothing to search");
            return Ok(Vec::new());
        }
        let embedder = self.embedder.as_ref().map_err(|reason| RetrievalError::ConfigurationUnavailable(reason.clone()))?;

        let query_vec = self
            .embed(embedder, vec![query.to_string()], "query embedding")
            .await?
            .pop()
            .ok_or_else(|| RetrievalError::Embedding(anyhow::anyhow!("embedder returned no vector for the query")))?;

        let (neighbors, space) = match &self.strategy {
            Strategy::PerCallIndex => {
                let vectors = self.embed(embedder, view.texts(), "filtered embedding").await?;
                if vectors.len() != view.len() {
                    return Err(RetrievalError::Embedding(anyhow::anyhow!(
                        "embedder returned {} vectors for {} chunks",
                        vectors.len(),
                        view.len()
                    )));
                }
                let dim = embedder.dim();
                let hits = self
                    .run_blocking(
                        "vector search",
                        move || FlatIndex::from_embeddings(dim, &vectors)?.search_sync(&query_vec, top_k),
                        RetrievalError::IndexSearch,
                    )
                    .await?;
                (hits, PositionSpace::FilteredView)
            }
            Strategy::GlobalPostFilter { index, candidate_multiplier } => {
                let k = top_k.saturating_mul(*candidate_multiplier);
                (self.search(index.as_ref(), &query_vec, k).await?, PositionSpace::FullStore)
            }
        };

        let excerpts = reconcile(&view, &neighbors, space, top_k);
        debug!(
            area,
            level = %level,
            view = view.len(),
            hits = neighbors.len(),
            kept = excerpts.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "retrieved"
        );
        Ok(excerpts)
    }

    async fn embed(&self, embedder: &Arc<dyn Embedder>, texts: Vec<String>, stage: &'static str) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let embedder = Arc::clone(embedder);
        self.run_blocking(stage, move || embedder.embed_batch(&texts), RetrievalError::Embedding).await
    }

    /// Run CPU-bound `work` off the async workers so the timeout can fire.
    async fn run_blocking<T, F>(&self, stage: &'static str, work: F, wrap: fn(anyhow::Error) -> RetrievalError) -> Result<T, RetrievalError>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(work);
        match tokio::time::timeout(self.timeout, task).await {
            Err(_) => Err(RetrievalError::Timeout { stage, elapsed: self.timeout }),
            Ok(Err(join)) => Err(wrap(join.into())),
            Ok(Ok(out)) => out.map_err(wrap),
        }
    }

    async fn search(&self, index: &dyn VectorIndex, query: &[f32], k: usize) -> Result<Vec<Neighbor>, RetrievalError> {
        match tokio::time::timeout(self.timeout, index.search(query, k)).await {
            Err(_) => Err(RetrievalError::Timeout { stage: "vector search", elapsed: self.timeout }),
            Ok(hits) => hits.map_err(RetrievalError::IndexSearch),
        }
    }
}

/// Map neighbours onto the filtered view, keeping their order.
///
/// Positions that land outside the view are dropped, as expected when
/// `top_k` exceeds the view or a global hit fails the filter.
pub fn reconcile(view: &FilteredView<'_>, neighbors: &[Neighbor], space: PositionSpace, top_k: usize) -> Vec<Excerpt> {
    neighbors
        .iter()
        .filter_map(|n| {
            let offset = match space {
                PositionSpace::FilteredView => Some(n.position),
                PositionSpace::FullStore => view.offset_of_position(n.position),
            };
            let entry = offset.and_then(|o| view.get(o));
            if entry.is_none() {
                trace!(position = n.position, ?space, "neighbour outside filtered view");
            }
            entry
        })
        .map(|(_, chunk)| Excerpt::from(chunk))
        .take(top_k)
        .collect()
}
