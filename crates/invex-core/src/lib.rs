//! Core library for invoice extraction.
//!
//! This crate provides:
//! - The canonical invoice record model shared by all backends
//! - Recursive normalization of tagged extraction values
//! - Document input handling (format allow-list, PDF first-page rendering)
//! - The extraction pipeline with best-effort archival

pub mod archive;
pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod normalize;
pub mod pdf;
pub mod pipeline;
pub mod record;
pub mod value;

pub use archive::{ArchiveStore, FsArchive, archive_name};
pub use backend::{BackendKind, ExtractionBackend};
pub use config::{ArchiveConfig, InvexConfig, StructuredConfig, VisionConfig};
pub use document::{Document, DocumentKind};
pub use error::{ArchiveError, DocumentError, ExtractError, InvexError, Result};
pub use normalize::normalize;
pub use pdf::{PdfDocument, render_first_page_png};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use record::{
    ExtractionResult, FIRST_CLASS_FIELDS, InvoiceRecord, LINE_ITEM_FIELDS, LineItem,
    collect_line_items,
};
pub use value::{AddressParts, CurrencyValue, ExtractedValue, ScalarValue};
