//! The extraction pipeline: dispatch, normalization, best-effort archival.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::archive::ArchiveStore;
use crate::backend::{BackendKind, ExtractionBackend};
use crate::document::Document;
use crate::error::ExtractError;
use crate::record::ExtractionResult;

/// Progression of one pipeline run. Failure is terminal only before a
/// record exists; archival problems never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Received,
    Extracting,
    Normalized,
    Archiving,
    Done,
}

/// A finished pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The extraction result, immutable once the backend returned it.
    pub extraction: ExtractionResult,

    /// Set when extraction succeeded but archival did not. "Parsed but
    /// not archived" is a valid outcome, distinct from a parse failure.
    pub archive_warning: Option<String>,
}

/// The extraction pipeline with its injected capabilities.
///
/// Both backends are constructed up front and shared for the process
/// lifetime; each run dispatches to exactly one of them.
pub struct Pipeline<S, V, A> {
    structured: S,
    vision: V,
    archive: A,
}

impl<S, V, A> Pipeline<S, V, A>
where
    S: ExtractionBackend,
    V: ExtractionBackend,
    A: ArchiveStore,
{
    pub fn new(structured: S, vision: V, archive: A) -> Self {
        Self {
            structured,
            vision,
            archive,
        }
    }

    /// Run one document through extraction and archival.
    ///
    /// The selected backend runs to completion with no fallback to the
    /// other. Once extraction has produced a record, that record is final:
    /// archival is still attempted, and its failure only sets
    /// `archive_warning`.
    pub async fn run(
        &self,
        document: Document,
        backend: BackendKind,
        archive_as: &str,
    ) -> Result<PipelineOutcome, ExtractError> {
        let start = Instant::now();
        let mut state = PipelineState::Received;
        debug!(?state, %backend, name = archive_as, "pipeline received document");

        state = PipelineState::Extracting;
        debug!(?state, "dispatching to {} backend", backend.as_str());
        let extraction = match backend {
            BackendKind::Structured => self.structured.extract(&document).await,
            BackendKind::Vision => self.vision.extract(&document).await,
        }
        .inspect_err(|e| {
            error!(
                name = archive_as,
                backend = backend.as_str(),
                "extraction failed: {e}"
            );
        })?;

        state = PipelineState::Normalized;
        debug!(
            ?state,
            fields = extraction.record.fields.len(),
            line_items = extraction.record.line_items.len(),
            "record finalized"
        );

        state = PipelineState::Archiving;
        let archive_warning = match self.archive.store(archive_as, document.bytes()).await {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    name = archive_as,
                    "archival failed, keeping extraction result: {e}"
                );
                Some(e.to_string())
            }
        };

        state = PipelineState::Done;
        info!(
            ?state,
            name = archive_as,
            elapsed_ms = start.elapsed().as_millis() as u64,
            archived = archive_warning.is_none(),
            "pipeline finished"
        );

        Ok(PipelineOutcome {
            extraction,
            archive_warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;
    use crate::record::InvoiceRecord;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct StubBackend {
        label: &'static str,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl StubBackend {
        fn ok(label: &'static str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    label,
                    fail: false,
                    calls: calls.clone(),
                },
                calls,
            )
        }

        fn failing(label: &'static str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    label,
                    fail: true,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl ExtractionBackend for StubBackend {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn extract(&self, _document: &Document) -> Result<ExtractionResult, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ExtractError::NoDocumentDetected);
            }
            let mut record = InvoiceRecord::new();
            record
                .fields
                .insert("InvoiceId".to_string(), Some(format!("from-{}", self.label)));
            Ok(ExtractionResult {
                record,
                raw_debug: serde_json::json!({"backend": self.label}),
            })
        }
    }

    struct StubArchive {
        fail: bool,
        stored: Arc<AtomicBool>,
    }

    impl StubArchive {
        fn ok() -> (Self, Arc<AtomicBool>) {
            let stored = Arc::new(AtomicBool::new(false));
            (
                Self {
                    fail: false,
                    stored: stored.clone(),
                },
                stored,
            )
        }

        fn failing() -> (Self, Arc<AtomicBool>) {
            let stored = Arc::new(AtomicBool::new(false));
            (
                Self {
                    fail: true,
                    stored: stored.clone(),
                },
                stored,
            )
        }
    }

    impl ArchiveStore for StubArchive {
        async fn store(&self, _name: &str, _bytes: &[u8]) -> Result<(), ArchiveError> {
            if self.fail {
                return Err(ArchiveError::Io(std::io::Error::other("disk full")));
            }
            self.stored.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn document() -> Document {
        Document::from_bytes(b"\x89PNG\r\n\x1a\npixels".to_vec(), None).unwrap()
    }

    #[tokio::test]
    async fn successful_run_carries_the_record_and_archives() {
        let (structured, _) = StubBackend::ok("structured");
        let (vision, vision_calls) = StubBackend::ok("vision");
        let (archive, stored) = StubArchive::ok();
        let pipeline = Pipeline::new(structured, vision, archive);

        let outcome = pipeline
            .run(document(), BackendKind::Structured, "abc_invoice.png")
            .await
            .unwrap();

        assert_eq!(
            outcome.extraction.record.get("InvoiceId"),
            Some("from-structured")
        );
        assert_eq!(outcome.archive_warning, None);
        assert!(stored.load(Ordering::SeqCst));
        assert_eq!(vision_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dispatch_reaches_only_the_selected_backend() {
        let (structured, structured_calls) = StubBackend::ok("structured");
        let (vision, vision_calls) = StubBackend::ok("vision");
        let (archive, _) = StubArchive::ok();
        let pipeline = Pipeline::new(structured, vision, archive);

        let outcome = pipeline
            .run(document(), BackendKind::Vision, "abc_invoice.png")
            .await
            .unwrap();

        assert_eq!(
            outcome.extraction.record.get("InvoiceId"),
            Some("from-vision")
        );
        assert_eq!(structured_calls.load(Ordering::SeqCst), 0);
        assert_eq!(vision_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn archival_failure_becomes_a_warning_not_an_error() {
        let (structured, _) = StubBackend::ok("structured");
        let (vision, _) = StubBackend::ok("vision");
        let (archive, _) = StubArchive::failing();
        let pipeline = Pipeline::new(structured, vision, archive);

        let outcome = pipeline
            .run(document(), BackendKind::Structured, "abc_invoice.png")
            .await
            .unwrap();

        // The record is intact even though archival failed.
        assert_eq!(
            outcome.extraction.record.get("InvoiceId"),
            Some("from-structured")
        );
        let warning = outcome.archive_warning.unwrap();
        assert!(warning.contains("disk full"));
    }

    #[tokio::test]
    async fn extraction_failure_skips_archival_entirely() {
        let (structured, _) = StubBackend::failing("structured");
        let (vision, _) = StubBackend::ok("vision");
        let (archive, stored) = StubArchive::ok();
        let pipeline = Pipeline::new(structured, vision, archive);

        let err = pipeline
            .run(document(), BackendKind::Structured, "abc_invoice.png")
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractError::NoDocumentDetected));
        assert!(!stored.load(Ordering::SeqCst));
    }
}
