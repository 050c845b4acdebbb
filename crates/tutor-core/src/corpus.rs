//! The curriculum corpus store and the opaque relationship graph.
//!
//! Both are loaded once at startup and never mutated; chunk positions are
//! stable for the life of the process and double as offsets into any index
//! built over the full corpus.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::types::Chunk;

#[derive(Debug, Clone, Default)]
pub struct CorpusStore {
    chunks: Vec<Chunk>,
}

impl CorpusStore {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    /// Load `curriculum_metadata.json`: a JSON array of chunks.
    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| load_error(path, e))?;
        let chunks: Vec<Chunk> = serde_json::from_str(&raw).map_err(|e| load_error(path, e))?;
        info!(path = %path.display(), chunks = chunks.len(), "loaded curriculum corpus");
        Ok(Self::new(chunks))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Chunk)> {
        self.chunks.iter().enumerate()
    }

    /// Known learning areas, sorted and de-duplicated.
    pub fn learning_areas(&self) -> Vec<String> {
        self.chunks
            .iter()
            .map(|c| c.metadata.learning_area.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn has_learning_area(&self, area: &str) -> bool {
        self.chunks.iter().any(|c| c.metadata.learning_area == area)
    }
}

/// Curriculum relationship graph in node-link JSON form.
///
/// Retrieval never looks inside it; it is loaded so that a broken graph file
/// fails startup like the other artifacts do.
#[derive(Debug, Clone, Default)]
pub struct CurriculumGraph {
    raw: serde_json::Value,
}

impl CurriculumGraph {
    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| load_error(path, e))?;
        let raw: serde_json::Value = serde_json::from_str(&raw).map_err(|e| load_error(path, e))?;
        let graph = Self { raw };
        info!(path = %path.display(), nodes = graph.node_count(), edges = graph.edge_count(), "loaded curriculum graph");
        Ok(graph)
    }

    pub fn node_count(&self) -> usize {
        self.count("nodes")
    }

    pub fn edge_count(&self) -> usize {
        // networkx writes "links" by default, "edges" when asked to
        self.count("edges").max(self.count("links"))
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.raw
    }

    fn count(&self, key: &str) -> usize {
        self.raw.get(key).and_then(serde_json::Value::as_array).map_or(0, Vec::len)
    }
}

fn load_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Load { path: path.to_path_buf(), reason: e.to_string() }
}
