//! Network extraction backends for invex.
//!
//! Two providers populate the same canonical record through
//! [`invex_core::ExtractionBackend`]:
//! - `structured`: a schema-driven document-analysis service with a
//!   submit/poll protocol and deeply tagged field values
//! - `vision`: a vision-capable language model constrained to a flat
//!   two-key JSON output

pub mod structured;
pub mod vision;

pub use structured::StructuredClient;
pub use vision::VisionClient;
