//! First-page raster extraction from PDF containers.
//!
//! The vision backend consumes a single raster image, so paginated input is
//! reduced to its first page before encoding. lopdf exposes the page tree
//! and image XObjects; full content-stream rasterization is out of scope,
//! which matches the scanned-invoice case where a page is one embedded scan.

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document as PdfFile, Object, ObjectId};
use tracing::{debug, trace};

use crate::error::DocumentError;

/// A loaded PDF container.
#[derive(Debug)]
pub struct PdfDocument {
    document: PdfFile,
}

impl PdfDocument {
    /// Parse a PDF from memory. Encrypted files are decrypted with an
    /// empty password when possible.
    pub fn load(data: &[u8]) -> Result<Self, DocumentError> {
        let mut document =
            PdfFile::load_mem(data).map_err(|e| DocumentError::PdfParse(e.to_string()))?;

        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(DocumentError::Encrypted);
            }
            debug!("decrypted PDF with empty password");
        }

        if document.get_pages().is_empty() {
            return Err(DocumentError::NoPages);
        }

        Ok(Self { document })
    }

    /// Number of pages in the container.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Extract the first page as a raster image.
    ///
    /// Prefers image XObjects referenced from the page's resources; when a
    /// page carries several (a logo next to the scan), the largest wins.
    pub fn first_page_image(&self) -> Result<DynamicImage, DocumentError> {
        let pages = self.document.get_pages();
        let page_id = pages.get(&1).copied().ok_or(DocumentError::NoPages)?;

        let mut images = self.page_images(page_id);
        if images.is_empty() {
            debug!("no XObject images on first page, scanning all objects");
            images = self.all_images();
        }

        images
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or(DocumentError::NoPageImage(1))
    }

    fn page_images(&self, page_id: ObjectId) -> Vec<DynamicImage> {
        let doc = &self.document;
        let mut images = Vec::new();

        if let Some(resources) = self.page_resources(page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = self.decode_image_object(obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        trace!("found {} images on first page", images.len());
        images
    }

    fn all_images(&self) -> Vec<DynamicImage> {
        self.document
            .objects
            .iter()
            .filter_map(|(_, object)| self.decode_image_object(object))
            .collect()
    }

    fn decode_image_object(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        let subtype = dict.get(b"Subtype").ok()?;
        if subtype.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        trace!("image XObject: {}x{}", width, height);

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) if !arr.is_empty() => {
                    arr.first().and_then(|o| o.as_name().ok())
                }
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    // JPEG data, already compressed; hand it to the decoder
                    // as-is.
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                // JPEG2000 and fax encodings are rare in invoice scans and
                // not worth decoding here.
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    return None;
                }
                _ => {}
            }
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self
                    .document
                    .get_object(*r)
                    .ok()
                    .and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8) as u8;

        decode_raw_image(&data, width, height, color_space, bits)
    }

    /// Resources dictionary for a page, walking up the page tree for
    /// inherited entries.
    fn page_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        let mut node_id = page_id;
        loop {
            let node = self.document.get_object(node_id).ok()?;
            let Object::Dictionary(dict) = node else {
                return None;
            };

            if let Ok(resources) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(res))) = self.document.dereference(resources) {
                    return Some(res.clone());
                }
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => node_id = *parent_id,
                _ => return None,
            }
        }
    }
}

fn decode_raw_image(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits: u8,
) -> Option<DynamicImage> {
    if bits != 8 {
        trace!("unsupported bits per component: {bits}");
        return None;
    }

    let pixels = (width as usize) * (height as usize);
    let mut rgba = Vec::with_capacity(pixels * 4);

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            for chunk in data[..pixels * 3].chunks_exact(3) {
                rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
            }
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            for &gray in &data[..pixels] {
                rgba.extend_from_slice(&[gray, gray, gray, 255]);
            }
        }
        _ => {
            trace!(
                "undecodable raw image: colorspace={:?}",
                String::from_utf8_lossy(color_space)
            );
            return None;
        }
    }

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}

/// Render the first page of a PDF to PNG bytes.
pub fn render_first_page_png(data: &[u8]) -> Result<Vec<u8>, DocumentError> {
    let pdf = PdfDocument::load(data)?;
    let image = pdf.first_page_image()?;

    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| DocumentError::PageEncode(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let err = PdfDocument::load(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, DocumentError::PdfParse(_)));
    }

    #[test]
    fn raw_rgb_data_decodes_to_an_image() {
        let data = vec![200u8; 2 * 2 * 3];
        let image = decode_raw_image(&data, 2, 2, b"DeviceRGB", 8).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 2);
    }

    #[test]
    fn raw_gray_data_decodes_to_an_image() {
        let data = vec![128u8; 4 * 4];
        let image = decode_raw_image(&data, 4, 4, b"DeviceGray", 8).unwrap();
        assert_eq!(image.width(), 4);
    }

    #[test]
    fn truncated_raw_data_is_skipped() {
        let data = vec![0u8; 5];
        assert!(decode_raw_image(&data, 4, 4, b"DeviceRGB", 8).is_none());
    }

    #[test]
    fn unusual_bit_depths_are_skipped() {
        let data = vec![0u8; 64];
        assert!(decode_raw_image(&data, 4, 4, b"DeviceRGB", 1).is_none());
    }
}
