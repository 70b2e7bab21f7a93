//! Document renderer – turns a document kind plus state into the frozen
//! page layout. Rendering is pure: no I/O, no clock, no randomness, so
//! the same state always yields the same layout.

use crate::fonts::FontManager;
use crate::layout::layout_page;
use crate::layout_config::{LayoutConfig, PageLayout};
use crate::model::DocumentState;
use crate::pagination::{paginate, DEFAULT_ITEMS_PER_PAGE};
use crate::templates;

/// The two document kinds this tool produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Sales invoice (Rechnung), paginated over line items.
    Invoice,
    /// Single-page provenance confirmation (B2B-Bestätigung).
    Confirmation,
}

impl DocumentKind {
    /// Filename label, also used for the PDF title.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "Rechnung",
            DocumentKind::Confirmation => "B2B_Bestätigung",
        }
    }
}

/// Page geometry and pagination knobs.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub margin_pt: f32,
    /// Invoice line items per page.
    pub items_per_page: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            // A4 with a 20 mm margin
            page_width_pt: crate::layout_config::A4_WIDTH_PT,
            page_height_pt: crate::layout_config::A4_HEIGHT_PT,
            margin_pt: 56.69,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

/// Render a document to its positioned page layout.
pub fn render(
    kind: DocumentKind,
    state: &DocumentState,
    config: &RenderConfig,
    fonts: &FontManager,
) -> Result<LayoutConfig, String> {
    if config.page_width_pt <= 2.0 * config.margin_pt
        || config.page_height_pt <= 2.0 * config.margin_pt
    {
        return Err(format!(
            "margin {}pt leaves no content area on a {}x{}pt page",
            config.margin_pt, config.page_width_pt, config.page_height_pt
        ));
    }

    let mut doc = LayoutConfig {
        title: format!("{}_{}", kind.label(), state.invoice_nr),
        page_width_pt: config.page_width_pt,
        page_height_pt: config.page_height_pt,
        pages: Vec::new(),
    };

    match kind {
        DocumentKind::Invoice => {
            for (i, page) in paginate(&state.items, config.items_per_page)
                .iter()
                .enumerate()
            {
                let tree = templates::invoice_page(state, page);
                let boxes = layout_page(
                    &tree,
                    config.page_width_pt,
                    config.page_height_pt,
                    config.margin_pt,
                    fonts,
                );
                doc.pages.push(PageLayout {
                    page_index: i,
                    boxes,
                });
            }
        }
        DocumentKind::Confirmation => {
            let tree = templates::confirmation_page(state);
            let boxes = layout_page(
                &tree,
                config.page_width_pt,
                config.page_height_pt,
                config.margin_pt,
                fonts,
            );
            doc.pages.push(PageLayout {
                page_index: 0,
                boxes,
            });
        }
    }

    Ok(doc)
}
