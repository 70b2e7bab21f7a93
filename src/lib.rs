//! # belegwerk – insolvency liquidation document generator
//!
//! This crate renders and exports the two document kinds used when selling
//! assets out of German insolvency proceedings: the sales invoice
//! (*Rechnung*) and the provenance confirmation (*B2B-Bestätigung*). The
//! pipeline stages are:
//!
//! 1. **State** – load the document snapshot, merged onto generated
//!    defaults ([`state`])
//! 2. **Paginate** – split invoice items into fixed-capacity pages
//!    ([`pagination`])
//! 3. **Render** – build pure, fixed-geometry page descriptors per
//!    document kind ([`render`], backed by [`templates`] and [`layout`])
//! 4. **Capture** – rasterize each page at an oversampled scale ([`raster`])
//! 5. **Assemble** – stretch each capture onto one A4 PDF page and write
//!    `<Label>_<invoiceNr>.pdf` ([`export`])
//!
//! Totals come from [`totals`]; free-text import goes through [`extract`].

pub mod export;
pub mod extract;
pub mod fonts;
pub mod layout;
pub mod layout_config;
pub mod model;
pub mod pagination;
pub mod raster;
pub mod render;
pub mod state;
pub mod style;
pub mod templates;
pub mod totals;

// Re-exports for convenience
pub use export::{ExportConfig, ExportPipeline, WrittenDocument};
pub use model::DocumentState;
pub use render::{render, DocumentKind, RenderConfig};
pub use totals::compute_totals;
