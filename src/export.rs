//! Export pipeline – renders a document, captures every page as an
//! oversampled PNG, and assembles the captures into an A4 PDF on disk.
//!
//! Captures live in memory only and each page is captured strictly in
//! order; the PDF reaches disk in a single write, so a failed export
//! never leaves a partial artifact behind.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use printpdf::{Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, RawImage, XObjectTransform};
use thiserror::Error;

use crate::fonts::FontManager;
use crate::layout_config::LayoutConfig;
use crate::model::DocumentState;
use crate::raster::{encode_png, rasterize_page};
use crate::render::{render, DocumentKind, RenderConfig};

/// Captures below this oversampling factor are too coarse to print; the
/// pipeline silently raises smaller requests to it.
pub const MIN_RASTER_SCALE: f32 = 4.0;

/// Where the pipeline currently is. Terminal states stay visible until
/// the next export begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Rendering,
    /// Capturing the page at this zero-based index.
    Capturing(usize),
    Assembling,
    Written,
    Failed,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("an export is already running")]
    Busy,
    #[error("document produced no content")]
    NoContent,
    #[error("render failed: {0}")]
    Render(String),
    #[error("capture of page {page} failed: {reason}")]
    Capture { page: usize, reason: String },
    #[error("PDF assembly failed: {0}")]
    Assembly(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory the PDF is written into (created if missing).
    pub out_dir: PathBuf,
    /// Oversampling factor; values below [`MIN_RASTER_SCALE`] are raised.
    pub raster_scale: f32,
    pub render: RenderConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            raster_scale: MIN_RASTER_SCALE,
            render: RenderConfig::default(),
        }
    }
}

impl ExportConfig {
    fn effective_scale(&self) -> f32 {
        self.raster_scale.max(MIN_RASTER_SCALE)
    }
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct WrittenDocument {
    pub path: PathBuf,
    pub bytes: usize,
    pub pages: usize,
}

/// One captured page, with the pixel dimensions the PNG was encoded at.
struct PageCapture {
    png: Vec<u8>,
    px_width: u32,
    px_height: u32,
}

pub struct ExportPipeline {
    fonts: FontManager,
    in_flight: AtomicBool,
    phase: Mutex<ExportPhase>,
}

impl ExportPipeline {
    pub fn new(fonts: FontManager) -> Self {
        Self {
            fonts,
            in_flight: AtomicBool::new(false),
            phase: Mutex::new(ExportPhase::Idle),
        }
    }

    /// The phase the last (or current) export reached.
    pub fn phase(&self) -> ExportPhase {
        self.phase
            .lock()
            .map(|p| p.clone())
            .unwrap_or(ExportPhase::Failed)
    }

    fn set_phase(&self, phase: ExportPhase) {
        if let Ok(mut slot) = self.phase.lock() {
            *slot = phase;
        }
    }

    /// Run the full export: render, capture pages in order, assemble, write.
    ///
    /// Only one export runs at a time; concurrent attempts fail with
    /// [`ExportError::Busy`] and leave the running export untouched.
    pub fn export_document(
        &self,
        kind: DocumentKind,
        state: &DocumentState,
        config: &ExportConfig,
    ) -> Result<WrittenDocument, ExportError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(ExportError::Busy);
        }
        let result = self.run(kind, state, config);
        self.set_phase(match &result {
            Ok(_) => ExportPhase::Written,
            Err(_) => ExportPhase::Failed,
        });
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    fn run(
        &self,
        kind: DocumentKind,
        state: &DocumentState,
        config: &ExportConfig,
    ) -> Result<WrittenDocument, ExportError> {
        self.set_phase(ExportPhase::Rendering);
        let layout =
            render(kind, state, &config.render, &self.fonts).map_err(ExportError::Render)?;

        let bytes = self.capture_and_assemble(&layout, config)?;

        fs::create_dir_all(&config.out_dir)?;
        let path = config
            .out_dir
            .join(format!("{}_{}.pdf", kind.label(), state.invoice_nr));
        fs::write(&path, &bytes)?;

        log::info!(
            "exported {} ({} bytes, {} pages)",
            path.display(),
            bytes.len(),
            layout.pages.len()
        );
        Ok(WrittenDocument {
            path,
            bytes: bytes.len(),
            pages: layout.pages.len(),
        })
    }

    fn capture_and_assemble(
        &self,
        layout: &LayoutConfig,
        config: &ExportConfig,
    ) -> Result<Vec<u8>, ExportError> {
        if layout.pages.is_empty() {
            return Err(ExportError::NoContent);
        }
        let scale = config.effective_scale();

        let mut captures = Vec::with_capacity(layout.pages.len());
        for (i, page) in layout.pages.iter().enumerate() {
            self.set_phase(ExportPhase::Capturing(i));
            let pixmap = rasterize_page(
                page,
                layout.page_width_pt,
                layout.page_height_pt,
                scale,
                &self.fonts,
            )
            .map_err(|reason| ExportError::Capture { page: i, reason })?;
            let png =
                encode_png(&pixmap).map_err(|reason| ExportError::Capture { page: i, reason })?;
            captures.push(PageCapture {
                png,
                px_width: pixmap.width(),
                px_height: pixmap.height(),
            });
        }

        self.set_phase(ExportPhase::Assembling);
        assemble_pdf(layout, &captures)
    }
}

/// Build the PDF in memory: one page per capture, each image stretched to
/// the full page.
fn assemble_pdf(layout: &LayoutConfig, captures: &[PageCapture]) -> Result<Vec<u8>, ExportError> {
    let page_w = Mm(layout.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(layout.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&layout.title);
    let mut warnings = Vec::new();
    let mut pages = Vec::with_capacity(captures.len());

    for capture in captures {
        let raw = RawImage::decode_from_bytes(&capture.png, &mut warnings)
            .map_err(|e| ExportError::Assembly(e.to_string()))?;
        let image_id = doc.add_image(&raw);

        // At dpi=72 printpdf maps 1 px to 1 pt, so scale = page_pt / px.
        let scale_x = if capture.px_width > 0 {
            layout.page_width_pt / capture.px_width as f32
        } else {
            1.0
        };
        let scale_y = if capture.px_height > 0 {
            layout.page_height_pt / capture.px_height as f32
        } else {
            1.0
        };

        let ops = vec![Op::UseXobject {
            id: image_id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                dpi: Some(72.0),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                rotate: None,
            },
        }];
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    doc.with_pages(pages);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}
