use tutor_core::corpus::CorpusStore;
use tutor_core::levels::YearLevel;
use tutor_core::types::{Chunk, UNKNOWN_LEVEL};

/// Chunks of the corpus matching one learning area and year level, in store
/// order, each paired with its position in the full store.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    entries: Vec<(usize, &'a Chunk)>,
}

impl<'a> FilteredView<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at an offset into the view.
    pub fn get(&self, offset: usize) -> Option<(usize, &'a Chunk)> {
        self.entries.get(offset).copied()
    }

    /// Offset into the view of the chunk at a full-store position.
    pub fn offset_of_position(&self, position: usize) -> Option<usize> {
        self.entries.binary_search_by_key(&position, |(p, _)| *p).ok()
    }

    pub fn entries(&self) -> &[(usize, &'a Chunk)] {
        &self.entries
    }

    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(|(_, c)| c.text.clone()).collect()
    }
}

/// Narrow the corpus to `area` at `level`.
///
/// A chunk's level field may name several levels, so the internal tag is
/// matched as a substring; `Unknown` chunks match every level. An empty view
/// is a normal result.
pub fn filter<'a>(corpus: &'a CorpusStore, area: &str, level: YearLevel) -> FilteredView<'a> {
    let tag = level.internal_tag();
    let entries = corpus.iter().filter(|(_, chunk)| matches(chunk, area, &tag)).collect();
    FilteredView { entries }
}

fn matches(chunk: &Chunk, area: &str, tag: &str) -> bool {
    chunk.metadata.learning_area == area && (chunk.metadata.level.contains(tag) || chunk.metadata.level == UNKNOWN_LEVEL)
}
