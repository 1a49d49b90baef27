use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a question, as issued by the backend.
///
/// Every page address and API path for a question ends with this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Wraps a raw identifier. Returns `None` for an empty or slash-bearing value.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw.contains('/') {
            return None;
        }
        Some(Self(raw))
    }

    /// Identifier of the `n`th question a backend issued: `q1`, `q2`, ...
    pub fn sequential(n: u64) -> Self {
        Self(format!("q{n}"))
    }

    /// Takes the final `/`-separated segment of a path or link.
    ///
    /// `"/question/q1"` yields `q1`; a trailing slash leaves an empty segment and yields `None`.
    pub fn from_path(path: &str) -> Option<Self> {
        let segment = path.rsplit('/').next().unwrap_or_default();
        Self::new(segment)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
