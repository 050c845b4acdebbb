use async_trait::async_trait;

use crate::types::Neighbor;

/// Maps text to fixed-length vectors.
///
/// Must be deterministic within a process: vectors used to build an index and
/// vectors computed at query time have to be comparable.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Read-only k-nearest-neighbour search.
///
/// Results are sorted nearest first. Positions refer to the vectors the index
/// was built over, in insertion order.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn len(&self) -> usize;
    fn dim(&self) -> usize;
    async fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decides whether a query plausibly belongs to a subject.
pub trait Classifier: Send + Sync {
    fn is_relevant(&self, query: &str, subject: &str) -> bool;
}

/// Turns a prompt into generated lesson text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
