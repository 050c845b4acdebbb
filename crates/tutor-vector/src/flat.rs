use anyhow::{ensure, Result};
use async_trait::async_trait;

use tutor_core::traits::VectorIndex;
use tutor_core::types::Neighbor;

/// Exact nearest-neighbour search by squared L2 distance.
///
/// Vectors are stored row-major; a vector's position is its insertion order.
/// Suitable for the corpus sizes a curriculum has (tens of thousands of
/// chunks) and for throwaway per-query indexes over a filtered subset.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    /// Build from a list of vectors; all must share the first vector's length.
    pub fn from_embeddings(dim: usize, embeddings: &[Vec<f32>]) -> Result<Self> {
        let mut index = Self::new(dim);
        index.data.reserve(dim * embeddings.len());
        for v in embeddings {
            index.add(v)?;
        }
        Ok(index)
    }

    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        ensure!(vector.len() == self.dim, "vector has dim {}, index expects {}", vector.len(), self.dim);
        self.data.extend_from_slice(vector);
        Ok(self.len() - 1)
    }

    /// Nearest `k` vectors, nearest first; ties keep insertion order.
    pub fn search_sync(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        ensure!(query.len() == self.dim, "query has dim {}, index expects {}", query.len(), self.dim);
        if k == 0 || self.dim == 0 {
            return Ok(Vec::new());
        }
        let mut hits: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(position, row)| Neighbor { position, distance: squared_l2(query, row) })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position)));
        hits.truncate(k);
        Ok(hits)
    }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.search_sync(query, k)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
