use serde::{Deserialize, Serialize};
use std::fmt;

/// Activities that need no query and no retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    Story,
    Maths,
    Science,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 3] = [ActivityKind::Story, ActivityKind::Maths, ActivityKind::Science];

    pub fn name(self) -> &'static str {
        match self {
            ActivityKind::Story => "Story",
            ActivityKind::Maths => "Maths",
            ActivityKind::Science => "Science",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the learner asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityRequest {
    /// Free-text question within a learning area; retrieval and the relevance
    /// gate both run.
    Custom { query: String, area: String },
    Fixed { kind: ActivityKind },
}

impl ActivityRequest {
    pub fn custom(query: impl Into<String>, area: impl Into<String>) -> Self {
        ActivityRequest::Custom { query: query.into(), area: area.into() }
    }

    pub fn fixed(kind: ActivityKind) -> Self {
        ActivityRequest::Fixed { kind }
    }

    /// Display name used in lesson titles and file names.
    pub fn label(&self) -> &'static str {
        match self {
            ActivityRequest::Custom { .. } => "Custom",
            ActivityRequest::Fixed { kind } => kind.name(),
        }
    }
}
