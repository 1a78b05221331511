// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open and inspect produced documents (page count, page sizes,
// embedded image sizes and placement, `/Info` metadata) using the `lopdf`
// crate. Backs `mkpdf info` and the integration tests.

use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use mkpdf_core::error::{ConvertError, Result};
use tracing::{debug, instrument};

use super::layout::PlacementRect;

/// The `/Info` dictionary of a document, decoded to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    /// Raw PDF date string, e.g. `D:20240309140500Z`.
    pub creation_date: Option<String>,
}

/// Read-only view of an existing PDF.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let data = std::fs::read(path_ref).map_err(|err| ConvertError::io(path_ref, err))?;
        let mut reader = Self::from_bytes(&data)?;
        reader.source_path = Some(path_ref.display().to_string());
        Ok(reader)
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| ConvertError::Decode(format!("not a readable PDF: {err}")))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Page `page_number` (1-indexed) MediaBox size in points.
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32)> {
        let page = self.page(page_number)?;
        let media_box = self
            .inherited(page, b"MediaBox")
            .and_then(|obj| obj.as_array().ok())
            .ok_or_else(|| ConvertError::Decode(format!("page {page_number} has no MediaBox")))?;
        let values: Vec<f32> = media_box.iter().filter_map(number).collect();
        match values.as_slice() {
            [x0, y0, x1, y1] => Ok(((x1 - x0).abs(), (y1 - y0).abs())),
            _ => Err(ConvertError::Decode(format!(
                "page {page_number} has a malformed MediaBox"
            ))),
        }
    }

    /// Pixel size of the first image XObject on a page, if it has one.
    pub fn page_image_size(&self, page_number: u32) -> Result<Option<(u32, u32)>> {
        let page = self.page(page_number)?;
        let Some(xobjects) = self
            .inherited(page, b"Resources")
            .and_then(|res| self.resolve(res).as_dict().ok())
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|xo| self.resolve(xo).as_dict().ok())
        else {
            return Ok(None);
        };

        for (_, value) in xobjects.iter() {
            if let Object::Stream(stream) = self.resolve(value) {
                let dim = |key: &[u8]| {
                    stream
                        .dict
                        .get(key)
                        .ok()
                        .and_then(|v| v.as_i64().ok())
                        .and_then(|v| u32::try_from(v).ok())
                };
                if let (Some(width), Some(height)) = (dim(b"Width"), dim(b"Height")) {
                    return Ok(Some((width, height)));
                }
            }
        }
        Ok(None)
    }

    /// Rectangle the page's image is drawn into, read back from the first
    /// `cm` operator of its content stream.
    pub fn image_placement(&self, page_number: u32) -> Result<Option<PlacementRect>> {
        let page_id = self.page_id(page_number)?;
        let raw = self
            .document
            .get_page_content(page_id)
            .map_err(|err| ConvertError::Decode(format!("page {page_number} content: {err}")))?;
        let content = Content::decode(&raw)
            .map_err(|err| ConvertError::Decode(format!("page {page_number} content: {err}")))?;

        let placement = content
            .operations
            .iter()
            .find(|op| op.operator == "cm")
            .map(|op| op.operands.iter().filter_map(number).collect::<Vec<f32>>())
            .and_then(|m| match m.as_slice() {
                [a, _, _, d, e, f] => Some(PlacementRect {
                    x: *e,
                    y: *f,
                    width: *a,
                    height: *d,
                }),
                _ => None,
            });
        Ok(placement)
    }

    /// Whether a page carries its own `/Metadata` stream.
    pub fn page_has_metadata(&self, page_number: u32) -> Result<bool> {
        Ok(self.page(page_number)?.has(b"Metadata"))
    }

    /// Decode the trailer's `/Info` dictionary. Missing entries stay `None`.
    pub fn metadata(&self) -> DocumentInfo {
        let Some(info) = self
            .document
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|obj| self.resolve(obj).as_dict().ok())
        else {
            return DocumentInfo::default();
        };

        let text = |key: &[u8]| info.get(key).ok().and_then(|v| decode_text(self.resolve(v)));
        DocumentInfo {
            title: text(b"Title"),
            author: text(b"Author"),
            subject: text(b"Subject"),
            keywords: text(b"Keywords"),
            creator: text(b"Creator"),
            producer: text(b"Producer"),
            creation_date: text(b"CreationDate"),
        }
    }

    // -- Helpers --------------------------------------------------------------

    fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            ConvertError::Decode(format!(
                "page {page_number} out of range (document has {} pages)",
                pages.len()
            ))
        })
    }

    fn page(&self, page_number: u32) -> Result<&Dictionary> {
        let id = self.page_id(page_number)?;
        self.document
            .get_dictionary(id)
            .map_err(|err| ConvertError::Decode(format!("page {page_number}: {err}")))
    }

    /// Look `key` up on a page, falling back to its ancestors in the page tree.
    fn inherited<'a>(&'a self, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        let mut node = page;
        // bounded walk; page trees are shallow
        for _ in 0..32 {
            if let Ok(value) = node.get(key) {
                return Some(value);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.document.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// PDF text string: UTF-16BE when it starts with a BOM, else UTF-8 with a
/// Latin-1 fallback.
fn decode_text(object: &Object) -> Option<String> {
    let Object::String(bytes, _) = object else {
        return None;
    };
    if let [0xFE, 0xFF, rest @ ..] = bytes.as_slice() {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).ok();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_string()),
        Err(_) => Some(bytes.iter().map(|&b| b as char).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::decode::SourceImage;
    use crate::pdf::writer::{PRODUCER, PageSetup, assemble};
    use image::{DynamicImage, RgbImage};
    use mkpdf_core::types::{PdfMetadata, TransformRequest};

    fn one_page_pdf(metadata: &PdfMetadata) -> Vec<u8> {
        let source = SourceImage::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(40, 30)));
        assemble(
            vec![(source, TransformRequest::identity())],
            PageSetup::default(),
            metadata,
        )
        .unwrap()
    }

    #[test]
    fn reads_back_pages_and_images() {
        let reader = PdfReader::from_bytes(&one_page_pdf(&PdfMetadata::default())).unwrap();
        assert_eq!(reader.page_count(), 1);
        let (w, h) = reader.page_size(1).unwrap();
        assert!((w - 595.28).abs() < 0.05 && (h - 841.89).abs() < 0.05);
        assert_eq!(reader.page_image_size(1).unwrap(), Some((40, 30)));
        assert!(!reader.page_has_metadata(1).unwrap());
        assert!(reader.page_size(2).is_err());
    }

    #[test]
    fn reads_back_metadata() {
        let meta = PdfMetadata::default()
            .with_title("Holiday")
            .with_author("山田太郎");
        let info = PdfReader::from_bytes(&one_page_pdf(&meta)).unwrap().metadata();
        assert_eq!(info.title.as_deref(), Some("Holiday"));
        assert_eq!(info.author.as_deref(), Some("山田太郎"));
        assert_eq!(info.subject, None);
        assert_eq!(info.producer.as_deref(), Some(PRODUCER));
        assert_eq!(info.creation_date, None);
    }

    #[test]
    fn garbage_is_decode_error() {
        let err = PdfReader::from_bytes(b"%PDF-nope").err().unwrap();
        assert_eq!(err.kind(), mkpdf_core::ErrorKind::Decode);
    }
}
