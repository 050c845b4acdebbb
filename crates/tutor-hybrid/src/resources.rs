use anyhow::{ensure, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use tutor_core::config::Settings;
use tutor_core::corpus::{CorpusStore, CurriculumGraph};
use tutor_core::traits::{Embedder, VectorIndex};
use tutor_core::types::{IndexBackend, ReconciliationPolicy};
use tutor_embed::get_default_embedder;
use tutor_vector::{FlatIndex, LanceIndex};

use crate::pipeline::LessonPipeline;
use crate::relevance::KeywordClassifier;
use crate::retriever::HybridRetriever;

/// Read-only state built once at startup and shared by every request.
pub struct Resources {
    pub settings: Settings,
    pub corpus: Arc<CorpusStore>,
    pub graph: CurriculumGraph,
    pub retriever: HybridRetriever,
    pub classifier: KeywordClassifier,
}

impl Resources {
    /// Load the corpus, graph, embedder and (for `global_post_filter`) the
    /// corpus-wide index. Relative data paths resolve against `base`.
    ///
    /// Missing artifacts are fatal. An embedder that fails to load is not:
    /// retrieval then reports it on every call, under either policy.
    pub async fn load(settings: Settings, base: &Path) -> Result<Self> {
        let corpus = Arc::new(CorpusStore::load_json(&settings.data.metadata_path(base))?);
        let graph = CurriculumGraph::load_json(&settings.data.graph_path(base))?;
        info!(
            chunks = corpus.len(),
            areas = corpus.learning_areas().len(),
            graph_nodes = graph.node_count(),
            graph_edges = graph.edge_count(),
            "curriculum loaded"
        );

        let embedder = get_default_embedder(&settings.embedding);
        let retriever = match &embedder {
            Ok(embedder) => HybridRetriever::new(Arc::clone(&corpus), Arc::clone(embedder)),
            Err(e) => {
                warn!(error = %e, "embedding model unavailable; retrieval will report it");
                HybridRetriever::without_embedder(Arc::clone(&corpus), e.to_string())
            }
        };
        let retriever = match settings.retrieval.policy {
            ReconciliationPolicy::PerCallIndex => retriever,
            ReconciliationPolicy::GlobalPostFilter => {
                let embedder = embedder.as_ref().ok().map(|e| &**e);
                match load_global_index(&settings, base, &corpus, embedder).await? {
                    Some(index) => retriever.with_global_index(index, settings.retrieval.candidate_multiplier),
                    None => {
                        warn!("no embedding model to build the in-memory index; using per-call retrieval");
                        retriever
                    }
                }
            }
        };
        let retriever = retriever.with_timeout(Duration::from_millis(settings.retrieval.timeout_ms));
        info!(policy = ?retriever.policy(), "retriever ready");

        let classifier = KeywordClassifier::from_settings(&settings.relevance);
        Ok(Self { settings, corpus, graph, retriever, classifier })
    }

    pub fn pipeline(&self) -> LessonPipeline<'_> {
        LessonPipeline::new(&self.retriever, &self.classifier, self.settings.retrieval.top_k)
    }

    pub fn learning_areas(&self) -> Vec<String> {
        self.corpus.learning_areas()
    }
}

/// `None` when the in-memory backend has no embedder to build from. A
/// prebuilt Lance index opens without one.
async fn load_global_index(
    settings: &Settings,
    base: &Path,
    corpus: &CorpusStore,
    embedder: Option<&dyn Embedder>,
) -> Result<Option<Arc<dyn VectorIndex>>> {
    let index: Arc<dyn VectorIndex> = match (settings.index.backend, embedder) {
        (IndexBackend::Memory, None) => return Ok(None),
        (IndexBackend::Memory, Some(embedder)) => {
            info!(chunks = corpus.len(), "embedding corpus into in-memory index");
            let texts: Vec<String> = corpus.chunks().iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed_batch(&texts)?;
            Arc::new(FlatIndex::from_embeddings(embedder.dim(), &vectors)?)
        }
        (IndexBackend::Lance, _) => {
            let dir = settings.data.index_dir(base);
            let table = &settings.data.index_table;
            Arc::new(
                LanceIndex::open(&dir, table)
                    .await
                    .with_context(|| format!("run tutor-build-index to create {}", dir.display()))?,
            )
        }
    };
    ensure!(
        index.len() == corpus.len(),
        "index has {} vectors but the corpus has {} chunks; rebuild the index",
        index.len(),
        corpus.len()
    );
    if let Some(embedder) = embedder {
        ensure!(index.dim() == embedder.dim(), "index dim {} does not match embedder dim {}", index.dim(), embedder.dim());
    }
    Ok(Some(index))
}
