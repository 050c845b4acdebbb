//! Domain types shared by the filter, the vector backends and the retriever.

use serde::{Deserialize, Deserializer, Serialize};

pub type ChunkId = String;

/// Level tag for chunks that apply to every year level.
pub const UNKNOWN_LEVEL: &str = "Unknown";

/// Structured metadata attached to every curriculum chunk.
///
/// `level` holds one or more internal level tags (e.g. `"Level 1, Level 2"`)
/// or [`UNKNOWN_LEVEL`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub learning_area: String,
    pub level: String,
}

/// One unit of curriculum text.
///
/// Identity is both the chunk's position in the corpus store and its `id`.
/// Ids in the metadata file may be strings or integers; both load as strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    #[serde(deserialize_with = "deserialize_chunk_id")]
    pub id: ChunkId,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(id: impl Into<ChunkId>, text: impl Into<String>, learning_area: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: ChunkMetadata { learning_area: learning_area.into(), level: level.into() },
        }
    }
}

/// A retrieved excerpt, as handed to prompt construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Excerpt {
    pub chunk_id: ChunkId,
    pub text: String,
}

impl From<&Chunk> for Excerpt {
    fn from(chunk: &Chunk) -> Self {
        Self { chunk_id: chunk.id.clone(), text: chunk.text.clone() }
    }
}

/// A nearest-neighbour hit.
///
/// `position` is an offset into whatever set of vectors the index was built
/// over; lower `distance` is nearer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// How the retriever reconciles index hits with the filtered view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationPolicy {
    /// Embed the filtered subset and search a throwaway index over it.
    #[default]
    PerCallIndex,
    /// Search the corpus-wide index and drop hits outside the filtered view.
    GlobalPostFilter,
}

/// Where the corpus-wide index lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
    /// Embed the whole corpus at startup into a flat in-memory index.
    #[default]
    Memory,
    /// Open a LanceDB table built ahead of time.
    Lance,
}

fn deserialize_chunk_id<'de, D>(deserializer: D) -> Result<ChunkId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ids_accept_strings_and_integers() {
        let json = r#"[
            {"id": "sci-1", "text": "Plants need water", "metadata": {"learning_area": "Science", "level": "Level 2"}},
            {"id": 42, "text": "Addition basics", "metadata": {"learning_area": "Mathematics", "level": "Unknown"}}
        ]"#;
        let chunks: Vec<Chunk> = serde_json::from_str(json).expect("parse");
        assert_eq!(chunks[0].id, "sci-1");
        assert_eq!(chunks[1].id, "42");
        assert_eq!(chunks[1].metadata.level, UNKNOWN_LEVEL);
    }

    #[test]
    fn policy_names_are_snake_case() {
        let p: ReconciliationPolicy = serde_json::from_str("\"global_post_filter\"").expect("parse");
        assert_eq!(p, ReconciliationPolicy::GlobalPostFilter);
        assert_eq!(ReconciliationPolicy::default(), ReconciliationPolicy::PerCallIndex);
    }
}
