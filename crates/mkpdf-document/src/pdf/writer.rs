// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembly: run each image through normalise → transform → layout →
// compose, append the pages in order, and serialise the finished PDF once with
// its `/Info` metadata, using the `lopdf` crate.
//
// Output is byte-for-byte deterministic for the same inputs as long as the
// metadata carries no creation date.

use std::io::{self, Write};

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat, dictionary};
use mkpdf_core::config::ConvertSettings;
use mkpdf_core::error::{ConvertError, Result};
use mkpdf_core::types::{ImagePosition, PageSize, PdfMetadata, Quality, ScalePolicy, TransformRequest};
use tracing::{debug, info, instrument};

use super::compose::{ComposedPage, IMAGE_RESOURCE, PageComposer};
use super::layout::{PageLayoutEngine, page_dimensions_pt};
use crate::image::decode::SourceImage;
use crate::image::normalize::ColorNormalizer;
use crate::image::processor::ImageTransformer;

/// Value of the `/Producer` entry.
pub const PRODUCER: &str = concat!("mkpdf ", env!("CARGO_PKG_VERSION"));

/// Document-wide page options; every page of one document shares them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub page_size: PageSize,
    pub position: ImagePosition,
    pub quality: Quality,
    pub scale: ScalePolicy,
}

impl PageSetup {
    pub fn new(page_size: PageSize, position: ImagePosition, quality: Quality) -> Self {
        Self {
            page_size,
            position,
            quality,
            scale: ScalePolicy::Fit,
        }
    }

    pub fn with_scale(mut self, scale: ScalePolicy) -> Self {
        self.scale = scale;
        self
    }

    pub fn from_settings(settings: &ConvertSettings) -> Self {
        Self {
            page_size: settings.page_size,
            position: settings.position,
            quality: settings.quality,
            scale: settings.scale,
        }
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::new(PageSize::A4, ImagePosition::Center, Quality::DEFAULT)
    }
}

/// Lifecycle of a [`DocumentAssembler`]: `Empty → Accumulating → Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    Empty,
    Accumulating,
    Finalized,
}

/// Builds one multi-page PDF, one page per image, in the order images are
/// added.
///
/// ```ignore
/// let mut assembler = DocumentAssembler::new(PageSetup::default())?;
/// assembler.add_image(SourceImage::open("cat.jpg")?, &TransformRequest::identity())?;
/// let pdf = assembler.finalize(&PdfMetadata::default().with_title("Cats"))?;
/// ```
pub struct DocumentAssembler {
    setup: PageSetup,
    page_width: f32,
    page_height: f32,
    normalizer: ColorNormalizer,
    layout: PageLayoutEngine,
    composer: PageComposer,
    document: Document,
    /// Reserved up front so every page can name its parent.
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    state: AssemblyState,
}

impl DocumentAssembler {
    /// Start an empty document. Fails if the page size itself is invalid.
    pub fn new(setup: PageSetup) -> Result<Self> {
        setup.page_size.validate()?;
        let (page_width, page_height) = page_dimensions_pt(setup.page_size);

        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();

        Ok(Self {
            setup,
            page_width,
            page_height,
            normalizer: ColorNormalizer::new(),
            layout: PageLayoutEngine::new(setup.scale),
            composer: PageComposer::new(),
            document,
            pages_id,
            page_ids: Vec::new(),
            state: AssemblyState::Empty,
        })
    }

    pub fn setup(&self) -> &PageSetup {
        &self.setup
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Page size in points.
    pub fn page_dimensions(&self) -> (f32, f32) {
        (self.page_width, self.page_height)
    }

    // -- Per-image pipeline ---------------------------------------------------

    /// Turn one source image into a page without touching the document.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn prepare_page(
        &self,
        source: SourceImage,
        request: &TransformRequest,
    ) -> Result<ComposedPage> {
        let normalized = self.normalizer.normalize(source);
        let transformed = ImageTransformer::apply(normalized, request)?;
        let placement = self.layout.place(
            transformed.width(),
            transformed.height(),
            self.page_width,
            self.page_height,
            self.setup.position,
        )?;
        debug!(?placement, "Image placed");
        self.composer.compose(
            &transformed,
            placement,
            (self.page_width, self.page_height),
            self.setup.quality,
        )
    }

    /// Run `source` through the pipeline and append the resulting page.
    pub fn add_image(&mut self, source: SourceImage, request: &TransformRequest) -> Result<()> {
        self.ensure_open()?;
        let page = self.prepare_page(source, request)?;
        self.add_page(page)
    }

    /// Append an already composed page. Its size must match the document's.
    pub fn add_page(&mut self, page: ComposedPage) -> Result<()> {
        self.ensure_open()?;
        let (width, height) = page.page_size();
        if (width - self.page_width).abs() > 0.01 || (height - self.page_height).abs() > 0.01 {
            return Err(ConvertError::Composition(format!(
                "page is {width}x{height} pt but the document uses {}x{} pt",
                self.page_width, self.page_height
            )));
        }

        let image_id = self.document.add_object(page.image_stream());
        let content_id = self.document.add_object(page.content_stream());
        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => page.media_box(),
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_RESOURCE => image_id,
                },
            },
        });
        self.page_ids.push(page_id);
        self.state = AssemblyState::Accumulating;

        debug!(page = self.page_ids.len(), "Page appended");
        Ok(())
    }

    // -- Finalisation ---------------------------------------------------------

    /// Write the page tree, catalog and `/Info`, and serialise the document.
    ///
    /// Succeeds at most once. An empty document is an error rather than a
    /// zero-page PDF.
    pub fn finalize(&mut self, metadata: &PdfMetadata) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.finalize_into(metadata, &mut output)?;
        Ok(output)
    }

    /// As [`DocumentAssembler::finalize`], writing to `target`. If writing
    /// fails the assembler is left as it was, so finalising can be retried.
    #[instrument(skip_all, fields(pages = self.page_ids.len()))]
    pub fn finalize_into<W: Write>(&mut self, metadata: &PdfMetadata, target: &mut W) -> Result<()> {
        match self.state {
            AssemblyState::Finalized => return Err(ConvertError::AlreadyFinalized),
            AssemblyState::Empty => return Err(ConvertError::NoImages),
            AssemblyState::Accumulating => {}
        }

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.document.add_object(info_dictionary(metadata));
        self.document.trailer.set("Root", catalog_id);
        self.document.trailer.set("Info", info_id);

        let mut counter = CountingWriter { inner: target, bytes: 0 };
        if let Err(err) = self.document.save_to(&mut counter) {
            for id in [self.pages_id, catalog_id, info_id] {
                self.document.objects.remove(&id);
            }
            self.document.trailer.remove(b"Root");
            self.document.trailer.remove(b"Info");
            return Err(ConvertError::Composition(format!(
                "failed to serialise PDF: {err}"
            )));
        }
        self.state = AssemblyState::Finalized;

        info!(pages = self.page_ids.len(), bytes = counter.bytes, "PDF assembled");
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == AssemblyState::Finalized {
            return Err(ConvertError::AlreadyFinalized);
        }
        Ok(())
    }
}

/// Byte-counting pass-through for the serialised document.
struct CountingWriter<'a, W: Write> {
    inner: &'a mut W,
    bytes: usize,
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.bytes += written;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Assemble `images` into one PDF, aborting on the first failing image.
pub fn assemble<I>(images: I, setup: PageSetup, metadata: &PdfMetadata) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (SourceImage, TransformRequest)>,
{
    let mut assembler = DocumentAssembler::new(setup)?;
    for (source, request) in images {
        assembler.add_image(source, &request)?;
    }
    assembler.finalize(metadata)
}

fn info_dictionary(metadata: &PdfMetadata) -> Dictionary {
    let mut info = Dictionary::new();
    for (key, value) in metadata.info_entries() {
        info.set(key, text_string(value));
    }
    info.set("Producer", text_string(PRODUCER));
    if let Some(date) = metadata.pdf_creation_date() {
        info.set("CreationDate", Object::string_literal(date));
    }
    info
}

/// PDF text string: a literal when ASCII, otherwise UTF-16BE with a BOM.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
