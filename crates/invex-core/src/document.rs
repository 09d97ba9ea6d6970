//! Document input handling: format allow-list and content sniffing.

use crate::error::DocumentError;

/// Document formats accepted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Pdf,
}

impl DocumentKind {
    /// Parse a MIME type from the allow-list.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/tiff" => Some(Self::Tiff),
            "image/bmp" => Some(Self::Bmp),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Map a file extension to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Identify a document by its magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            Some(Self::Tiff)
        } else if bytes.starts_with(b"BM") {
            Some(Self::Bmp)
        } else if bytes.starts_with(b"%PDF-") {
            Some(Self::Pdf)
        } else {
            None
        }
    }

    /// The canonical MIME type for this kind.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
            Self::Pdf => "application/pdf",
        }
    }

    /// Whether the format is a paginated container rather than a single
    /// raster image.
    pub fn is_paginated(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

/// An input document: raw bytes plus their identified format.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    kind: DocumentKind,
}

impl Document {
    /// Build a document from raw bytes. The content's magic bytes win;
    /// the caller's MIME hint is the fallback for formats whose header is
    /// ambiguous or missing.
    pub fn from_bytes(bytes: Vec<u8>, mime_hint: Option<&str>) -> Result<Self, DocumentError> {
        if bytes.is_empty() {
            return Err(DocumentError::Empty);
        }
        let kind = DocumentKind::sniff(&bytes)
            .or_else(|| mime_hint.and_then(DocumentKind::from_mime))
            .ok_or_else(|| {
                DocumentError::UnsupportedFormat(mime_hint.unwrap_or("unknown").to_string())
            })?;
        Ok(Self { bytes, kind })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sniffs_every_allowed_format() {
        assert_eq!(
            DocumentKind::sniff(b"\x89PNG\r\n\x1a\n...."),
            Some(DocumentKind::Png)
        );
        assert_eq!(
            DocumentKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(DocumentKind::Jpeg)
        );
        assert_eq!(DocumentKind::sniff(b"II*\0...."), Some(DocumentKind::Tiff));
        assert_eq!(DocumentKind::sniff(b"MM\0*...."), Some(DocumentKind::Tiff));
        assert_eq!(DocumentKind::sniff(b"BM...."), Some(DocumentKind::Bmp));
        assert_eq!(
            DocumentKind::sniff(b"%PDF-1.7\n"),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(DocumentKind::sniff(b"GIF89a"), None);
    }

    #[test]
    fn mime_hint_is_the_fallback_for_unrecognized_content() {
        let doc = Document::from_bytes(b"not a known header".to_vec(), Some("image/png")).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Png);
    }

    #[test]
    fn unsupported_input_is_rejected() {
        let err = Document::from_bytes(b"GIF89a....".to_vec(), Some("image/gif")).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = Document::from_bytes(Vec::new(), Some("image/png")).unwrap_err();
        assert!(matches!(err, DocumentError::Empty));
    }

    #[test]
    fn only_pdf_is_paginated() {
        assert!(DocumentKind::Pdf.is_paginated());
        assert!(!DocumentKind::Png.is_paginated());
        assert!(!DocumentKind::Jpeg.is_paginated());
    }
}
