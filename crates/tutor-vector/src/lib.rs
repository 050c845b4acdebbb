//! Nearest-neighbour indexes over curriculum embeddings.
//!
//! [`FlatIndex`] is an exact in-memory L2 index, used both for per-query
//! indexes over a filtered subset and as an in-memory corpus-wide index.
//! [`LanceIndex`] persists the corpus-wide index as a LanceDB table.

pub mod flat;
pub mod lance;
pub mod schema;

pub use flat::FlatIndex;
pub use lance::LanceIndex;
