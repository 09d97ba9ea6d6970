//! The extraction backend contract and strategy selection.

use std::future::Future;

use crate::document::Document;
use crate::error::ExtractError;
use crate::record::ExtractionResult;

/// Trait for extraction backends.
///
/// Both providers populate the same canonical record; the pipeline treats
/// them as injected capabilities and never falls back from one to the
/// other. Futures are cancellable by dropping them, which is how a caller
/// abandons a long poll.
pub trait ExtractionBackend: Send + Sync {
    /// Stable name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Run one extraction over the document, to completion.
    fn extract(
        &self,
        document: &Document,
    ) -> impl Future<Output = Result<ExtractionResult, ExtractError>> + Send;
}

/// Which backend a caller selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Schema-driven structured document-analysis service.
    Structured,
    /// Vision-capable language model.
    Vision,
}

impl BackendKind {
    /// Parse the caller-supplied selector string.
    ///
    /// Exactly two values are accepted; anything else fails here, before
    /// any backend client is touched.
    pub fn parse(selector: &str) -> Result<Self, ExtractError> {
        match selector {
            "structured" => Ok(Self::Structured),
            "vision" => Ok(Self::Vision),
            other => Err(ExtractError::InvalidStrategy(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Vision => "vision",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn both_selectors_parse() {
        assert_eq!(
            BackendKind::parse("structured").unwrap(),
            BackendKind::Structured
        );
        assert_eq!(BackendKind::parse("vision").unwrap(), BackendKind::Vision);
    }

    #[test]
    fn unknown_selector_is_an_invalid_strategy() {
        let err = BackendKind::parse("both").unwrap_err();
        match err {
            ExtractError::InvalidStrategy(s) => assert_eq!(s, "both"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn selector_round_trips_through_as_str() {
        for kind in [BackendKind::Structured, BackendKind::Vision] {
            assert_eq!(BackendKind::parse(kind.as_str()).unwrap(), kind);
        }
    }
}
