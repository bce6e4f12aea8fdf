//! Analysis identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier attached to every analysis response.
///
/// Rendered as `analysis_<32 hex chars>`; unique per call, never reused.
#[derive(Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(String);

impl AnalysisId {
    const PREFIX: &'static str = "analysis_";

    /// Create a new unique AnalysisId
    pub fn new() -> Self {
        Self(format!("{}{}", Self::PREFIX, uuid::Uuid::new_v4().simple()))
    }

    /// Wrap an existing identifier (for replaying recorded responses)
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnalysisId({})", self.0)
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation() {
        let id1 = AnalysisId::new();
        let id2 = AnalysisId::new();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("analysis_"));
        assert_eq!(id1.as_str().len(), "analysis_".len() + 32);
    }

    #[test]
    fn test_from_raw() {
        let id = AnalysisId::from_raw("analysis_42");
        assert_eq!(id.to_string(), "analysis_42");
    }
}
