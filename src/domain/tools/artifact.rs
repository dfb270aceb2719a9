//! Documents produced by tools during a conversation.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Requirements,
    Solution,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Requirements => write!(f, "requirements"),
            ArtifactKind::Solution => write!(f, "solution"),
        }
    }
}

/// A document captured by a save tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub content: String,
}

impl Artifact {
    pub fn requirements(content: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Requirements,
            content: content.into(),
        }
    }

    pub fn solution(content: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Solution,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_kind_serializes_snake_case() {
        let json = serde_json::to_value(Artifact::requirements("x")).unwrap();
        assert_eq!(json["kind"], "requirements");
        assert_eq!(ArtifactKind::Solution.to_string(), "solution");
    }
}
