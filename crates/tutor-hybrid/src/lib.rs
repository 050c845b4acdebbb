//! Curriculum retrieval and lesson preparation.
//!
//! A query is answered in two independent halves that the
//! [`LessonPipeline`] combines:
//!
//! * [`HybridRetriever`] filters the corpus by learning area and year level,
//!   then ranks the filtered chunks by embedding distance to the query. How
//!   index hits are mapped back onto the filtered view is explicit; see
//!   [`ReconciliationPolicy`](tutor_core::types::ReconciliationPolicy) and
//!   [`PositionSpace`].
//! * A [`Classifier`](tutor_core::traits::Classifier) (by default
//!   [`KeywordClassifier`]) decides whether the query fits the subject, which
//!   selects the grounded or the redirect prompt.

pub mod activity;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod prompt;
pub mod relevance;
pub mod resources;
pub mod retriever;

pub use activity::{ActivityKind, ActivityRequest};
pub use error::RetrievalError;
pub use filter::{filter, FilteredView};
pub use pipeline::{Lesson, LessonPipeline, PreparedLesson};
pub use relevance::{KeywordClassifier, KeywordTable};
pub use resources::Resources;
pub use retriever::{reconcile, HybridRetriever, PositionSpace, Retrieval};
