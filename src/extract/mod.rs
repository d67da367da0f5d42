//! Content extraction: page classification, structured API parsing, chunking.
use std::path::Path;

use thiserror::Error;

pub mod chunk;
pub mod html;
pub mod reference;
pub mod signature;

/// Errors that can occur while extracting a documentation page.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("page has no title or header element")]
    MissingTitle,

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Classification of a documentation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    Manual,
    ScriptReference,
}

impl DocType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Manual => "manual",
            DocType::ScriptReference => "script_reference",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(DocType::Manual),
            "script_reference" => Some(DocType::ScriptReference),
            _ => None,
        }
    }

    /// Classify a page by its path within the documentation tree.
    ///
    /// Pure function of the input: a `ScriptReference` path segment wins,
    /// then `Manual`. Anything else falls back to manual and is logged.
    #[must_use]
    pub fn classify(path: &Path) -> Self {
        for component in path.components() {
            match component.as_os_str().to_str() {
                Some("ScriptReference") => return DocType::ScriptReference,
                Some("Manual") => return DocType::Manual,
                _ => {}
            }
        }
        tracing::debug!(
            "Ambiguous doc type for {}, falling back to manual",
            path.display()
        );
        DocType::Manual
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_script_reference() {
        let path = Path::new("Documentation/en/ScriptReference/Rigidbody.html");
        assert_eq!(DocType::classify(path), DocType::ScriptReference);
    }

    #[test]
    fn test_classify_manual() {
        let path = Path::new("Documentation/en/Manual/RigidbodiesOverview.html");
        assert_eq!(DocType::classify(path), DocType::Manual);
    }

    #[test]
    fn test_classify_ambiguous_falls_back_to_manual() {
        let path = Path::new("Documentation/en/Glossary.html");
        assert_eq!(DocType::classify(path), DocType::Manual);
    }

    #[test]
    fn test_classify_deterministic() {
        let path = Path::new("en/ScriptReference/Transform.html");
        assert_eq!(DocType::classify(path), DocType::classify(path));
    }

    #[test]
    fn test_doc_type_round_trip() {
        assert_eq!(DocType::parse("manual"), Some(DocType::Manual));
        assert_eq!(
            DocType::parse("script_reference"),
            Some(DocType::ScriptReference)
        );
        assert_eq!(DocType::parse("unknown"), None);
        assert_eq!(DocType::parse(DocType::Manual.as_str()), Some(DocType::Manual));
    }
}
