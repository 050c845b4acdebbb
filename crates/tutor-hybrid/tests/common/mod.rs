#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tutor_core::corpus::CorpusStore;
use tutor_core::traits::{Embedder, Generator, VectorIndex};
use tutor_core::types::{Chunk, Neighbor};
use tutor_embed::FakeEmbedder;
use tutor_vector::FlatIndex;

pub const DIM: usize = 64;

pub fn corpus() -> Arc<CorpusStore> {
    Arc::new(CorpusStore::new(vec![
        Chunk::new("sci-2-plants", "Plants need water and sunlight to grow", "Science", "Level 2"),
        Chunk::new("mat-2-add", "Addition basics with counting objects", "Mathematics", "Level 2"),
        Chunk::new("sci-any-safety", "Stay safe when you explore outside", "Science", "Unknown"),
        Chunk::new("sci-2-animals", "Animals need food water and shelter", "Science", "Level 1, Level 2"),
        Chunk::new("eng-2-story", "A story has a beginning a middle and an end", "English", "Level 2"),
        Chunk::new("sci-5-light", "Light travels in straight lines and makes shadows", "Science", "Level 5"),
        Chunk::new("sci-2-weather", "Weather changes and water falls as rain", "Science", "Level 2"),
        Chunk::new("mat-5-shape", "Shapes have sides and corners", "Mathematics", "Level 5"),
    ]))
}

/// Counts `embed_batch` calls and the texts embedded.
pub struct CountingEmbedder {
    inner: FakeEmbedder,
    pub calls: AtomicUsize,
    pub texts: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self { inner: FakeEmbedder::new(DIM), calls: AtomicUsize::new(0), texts: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for CountingEmbedder {
    fn dim(&self) -> usize {
        DIM
    }

    fn max_len(&self) -> usize {
        self.inner.max_len()
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts)
    }
}

/// Flat index over the whole corpus that counts searches.
pub struct CountingIndex {
    inner: FlatIndex,
    pub searches: AtomicUsize,
}

impl CountingIndex {
    pub fn over(corpus: &CorpusStore) -> Self {
        let texts: Vec<String> = corpus.chunks().iter().map(|c| c.text.clone()).collect();
        let vectors = FakeEmbedder::new(DIM).embed_batch(&texts).unwrap();
        Self { inner: FlatIndex::from_embeddings(DIM, &vectors).unwrap(), searches: AtomicUsize::new(0) }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for CountingIndex {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn dim(&self) -> usize {
        DIM
    }

    async fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.inner.search(query, k).await
    }
}

pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize {
        DIM
    }

    fn max_len(&self) -> usize {
        256
    }

    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("model crashed")
    }
}

pub struct SlowEmbedder(pub Duration);

impl Embedder for SlowEmbedder {
    fn dim(&self) -> usize {
        DIM
    }

    fn max_len(&self) -> usize {
        256
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        std::thread::sleep(self.0);
        FakeEmbedder::new(DIM).embed_batch(texts)
    }
}

pub struct FailingIndex {
    pub len: usize,
}

#[async_trait]
impl VectorIndex for FailingIndex {
    fn len(&self) -> usize {
        self.len
    }

    fn dim(&self) -> usize {
        DIM
    }

    async fn search(&self, _query: &[f32], _k: usize) -> anyhow::Result<Vec<Neighbor>> {
        anyhow::bail!("index file truncated")
    }
}

pub struct SlowIndex {
    pub len: usize,
    pub delay: Duration,
}

#[async_trait]
impl VectorIndex for SlowIndex {
    fn len(&self) -> usize {
        self.len
    }

    fn dim(&self) -> usize {
        DIM
    }

    async fn search(&self, _query: &[f32], _k: usize) -> anyhow::Result<Vec<Neighbor>> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }
}

/// Replies with a fixed result and records the prompts it was given.
pub struct ScriptedGenerator {
    reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(text: &str) -> Self {
        Self { reply: Ok(text.to_string()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn failing(reason: &str) -> Self {
        Self { reply: Err(reason.to_string()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(|e| anyhow::anyhow!(e))
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
