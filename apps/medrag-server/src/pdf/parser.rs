//! PDF access using MuPDF
//!
//! Provides the two primitives the extraction pipeline needs: rendering a
//! page to a PNG bitmap for OCR, and reading a page's embedded text layer.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use mupdf::{Colorspace, Document, Matrix, MetadataName};
use serde::Serialize;
use thiserror::Error;

/// PDF errors
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to load PDF: {0}")]
    LoadError(String),
    #[error("Failed to render page: {0}")]
    RenderError(String),
    #[error("Page {0} not found (document has {1} pages)")]
    PageNotFound(usize, usize),
    #[error("Image encoding error: {0}")]
    ImageError(String),
    #[error("MuPDF error: {0}")]
    MuPdfError(String),
}

impl From<mupdf::Error> for PdfError {
    fn from(e: mupdf::Error) -> Self {
        PdfError::MuPdfError(e.to_string())
    }
}

/// Metadata from the PDF info dictionary plus file facts
#[derive(Debug, Clone, Default, Serialize)]
pub struct PdfMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    pub creator: String,
    pub producer: String,
    pub creation_date: String,
    pub modification_date: String,
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub page_count: usize,
}

/// MuPDF-backed parser for a PDF on disk
///
/// MuPDF's fz_context is not thread-safe, so every operation opens a fresh
/// `Document` and the parser itself only stores the path. Callers run these
/// methods on the blocking thread pool.
pub struct PdfParser {
    path: PathBuf,
    page_count: usize,
}

impl PdfParser {
    /// Open and validate a PDF file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PdfError> {
        let path = path.as_ref().to_path_buf();
        let doc = Document::open(&*path.to_string_lossy())
            .map_err(|e| PdfError::LoadError(e.to_string()))?;
        let page_count = doc.page_count()? as usize;

        Ok(Self { path, page_count })
    }

    fn open_document(&self) -> Result<Document, PdfError> {
        Document::open(&*self.path.to_string_lossy()).map_err(|e| PdfError::LoadError(e.to_string()))
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Read the info dictionary
    pub fn metadata(&self) -> Result<PdfMetadata, PdfError> {
        let doc = self.open_document()?;
        let get_meta = |name: MetadataName| -> String { doc.metadata(name).unwrap_or_default() };

        let file_size = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(PdfMetadata {
            title: get_meta(MetadataName::Title),
            author: get_meta(MetadataName::Author),
            subject: get_meta(MetadataName::Subject),
            keywords: get_meta(MetadataName::Keywords),
            creator: get_meta(MetadataName::Creator),
            producer: get_meta(MetadataName::Producer),
            creation_date: get_meta(MetadataName::CreationDate),
            modification_date: get_meta(MetadataName::ModDate),
            file_path: self.path.display().to_string(),
            file_name,
            file_size,
            page_count: self.page_count,
        })
    }

    /// Validate page number (1-indexed)
    fn validate_page_num(&self, page_num: usize) -> Result<(), PdfError> {
        if page_num < 1 || page_num > self.page_count {
            return Err(PdfError::PageNotFound(page_num, self.page_count));
        }
        Ok(())
    }

    /// Render a page to PNG at the given resolution
    pub fn render_page_png(&self, page_num: usize, dpi: u32) -> Result<Vec<u8>, PdfError> {
        self.validate_page_num(page_num)?;

        let doc = self.open_document()?;
        let page = doc.load_page((page_num - 1) as i32)?;

        // PDF user space is 72 units per inch
        let scale = dpi as f32 / 72.0;
        let matrix = Matrix::new_scale(scale, scale);
        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), false, false)
            .map_err(|e| PdfError::RenderError(e.to_string()))?;

        encode_png(&pixmap)
    }

    /// Embedded text layer of a page
    pub fn page_text(&self, page_num: usize) -> Result<String, PdfError> {
        self.validate_page_num(page_num)?;

        let doc = self.open_document()?;
        let page = doc.load_page((page_num - 1) as i32)?;

        page.to_text().map_err(Into::into)
    }
}

/// Encode an RGB(A) pixmap as PNG
fn encode_png(pixmap: &mupdf::Pixmap) -> Result<Vec<u8>, PdfError> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;
    let pixels = width as usize * height as usize;

    let mut rgb = Vec::with_capacity(pixels * 3);
    for pixel in samples.chunks_exact(n).take(pixels) {
        rgb.extend_from_slice(&pixel[..3.min(n)]);
        // Grayscale pixmaps only carry one component
        for _ in n..3 {
            rgb.push(pixel[0]);
        }
    }

    let img = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| PdfError::ImageError("Failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| PdfError::ImageError(e.to_string()))?;

    Ok(output)
}
