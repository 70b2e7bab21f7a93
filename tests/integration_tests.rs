//! Integration tests for the belegwerk document pipeline.
//!
//! These tests validate:
//! - Totals and the tax-region policy on realistic states
//! - Invoice pagination and page flags
//! - Deterministic, fixed-geometry rendering
//! - End-to-end export: a valid PDF under the documented filename
//! - State persistence round-trips, including falsy values
//! - Extraction patches flowing into the store

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tempfile::tempdir;

use belegwerk::export::{ExportConfig, ExportPipeline};
use belegwerk::extract::{Extractor, NullExtractor, StatePatch};
use belegwerk::fonts::FontManager;
use belegwerk::layout_config::{LayoutBox, LayoutConfig};
use belegwerk::model::{current_year, DocumentState, LineItem, TaxRegion};
use belegwerk::pagination::paginate;
use belegwerk::render::{render, DocumentKind, RenderConfig};
use belegwerk::state::{DocumentStore, JsonFileStore, MemoryStore, Persistence};
use belegwerk::totals::compute_totals;

// =====================================================================
// Helpers
// =====================================================================

fn item(id: &str, quantity: f64, unit_price: f64) -> LineItem {
    LineItem {
        id: id.to_string(),
        name: format!("Position {id}"),
        article_nr: format!("10{id}"),
        quantity,
        unit_price,
        description: None,
        notes: None,
    }
}

fn scenario_state() -> DocumentState {
    let mut state = DocumentState::generated();
    state.invoice_nr = "2025-44310".to_string();
    state.client.customer_nr = "44310".to_string();
    state.items = vec![item("1", 7.0, 3783.0)];
    state.tax_region = TaxRegion::De;
    state.tax_rate = 0.19;
    state
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

/// Small page geometry keeps the 4x capture buffers manageable.
fn small_export_config(dir: &Path) -> ExportConfig {
    ExportConfig {
        out_dir: dir.to_path_buf(),
        raster_scale: 4.0,
        render: RenderConfig {
            page_width_pt: 300.0,
            page_height_pt: 424.0,
            margin_pt: 28.0,
            items_per_page: 8,
        },
    }
}

fn visit_box(lbox: &LayoutBox, f: &mut dyn FnMut(&LayoutBox)) {
    f(lbox);
    for child in &lbox.children {
        visit_box(child, f);
    }
}

fn document_text(config: &LayoutConfig) -> String {
    let mut out = String::new();
    for page in &config.pages {
        for lbox in &page.boxes {
            visit_box(lbox, &mut |b| {
                if let Some(text) = &b.text {
                    for line in &text.lines {
                        out.push_str(&line.text);
                        out.push('\n');
                    }
                }
            });
        }
    }
    out
}

// =====================================================================
// Financial calculator scenarios
// =====================================================================

#[test]
fn domestic_invoice_totals() {
    // 7 × 3783.00 at 19% German VAT
    let state = scenario_state();
    let totals = compute_totals(&state.items, state.tax_region, state.tax_rate);

    assert!((totals.subtotal - 26_481.0).abs() < 1e-6);
    assert!((totals.tax - 5_031.39).abs() < 1e-6);
    assert!((totals.total - 31_512.39).abs() < 1e-6);
}

#[test]
fn intra_community_export_is_tax_free() {
    let mut state = scenario_state();
    state.tax_region = TaxRegion::Eu;
    let totals = compute_totals(&state.items, state.tax_region, state.tax_rate);

    assert_eq!(totals.tax, 0.0);
    assert!((totals.total - 26_481.0).abs() < 1e-6);
}

#[test]
fn totals_are_additive_over_item_partitions() {
    let all: Vec<LineItem> = (0..10)
        .map(|i| item(&i.to_string(), i as f64, 250.0 + i as f64))
        .collect();
    let (a, b) = all.split_at(4);

    let whole = compute_totals(&all, TaxRegion::De, 0.19);
    let left = compute_totals(a, TaxRegion::De, 0.19);
    let right = compute_totals(b, TaxRegion::De, 0.19);

    assert!((whole.subtotal - (left.subtotal + right.subtotal)).abs() < 1e-9);
    assert!((whole.tax - (left.tax + right.tax)).abs() < 1e-9);
}

// =====================================================================
// Pagination
// =====================================================================

#[test]
fn seventeen_items_split_as_8_8_1() {
    let items: Vec<LineItem> = (0..17).map(|i| item(&i.to_string(), 1.0, 10.0)).collect();
    let pages = paginate(&items, 8);

    let sizes: Vec<usize> = pages.iter().map(|p| p.items.len()).collect();
    assert_eq!(sizes, vec![8, 8, 1]);

    assert!(pages[0].is_first && !pages[1].is_first && !pages[2].is_first);
    assert!(!pages[0].is_last && !pages[1].is_last && pages[2].is_last);
    assert!(!pages[0].has_totals && !pages[1].has_totals && pages[2].has_totals);
    let numbers: Vec<usize> = pages.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn pagination_preserves_item_order() {
    let items: Vec<LineItem> = (0..23).map(|i| item(&i.to_string(), 1.0, 1.0)).collect();
    let pages = paginate(&items, 5);

    let flattened: Vec<&str> = pages
        .iter()
        .flat_map(|p| p.items.iter().map(|i| i.id.as_str()))
        .collect();
    let original: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(flattened, original);
}

// =====================================================================
// Rendering
// =====================================================================

#[test]
fn invoice_rendering_is_deterministic() {
    let state = scenario_state();
    let fonts = FontManager::default();
    let config = RenderConfig::default();

    let a = render(DocumentKind::Invoice, &state, &config, &fonts).unwrap();
    let b = render(DocumentKind::Invoice, &state, &config, &fonts).unwrap();

    let h1 = Sha256::digest(a.to_json().as_bytes());
    let h2 = Sha256::digest(b.to_json().as_bytes());
    assert_eq!(h1, h2, "identical state must render byte-identically");
}

#[test]
fn invoice_page_count_follows_item_count() {
    let mut state = scenario_state();
    state.items = (0..17).map(|i| item(&i.to_string(), 1.0, 50.0)).collect();
    let fonts = FontManager::default();

    let config = render(DocumentKind::Invoice, &state, &RenderConfig::default(), &fonts).unwrap();
    assert_eq!(config.pages.len(), 3);
    assert!((config.page_width_pt - 595.28).abs() < 0.01);
    assert!((config.page_height_pt - 841.89).abs() < 0.01);
}

#[test]
fn confirmation_is_always_a_single_page() {
    let mut state = scenario_state();
    state.items = (0..30).map(|i| item(&i.to_string(), 1.0, 50.0)).collect();
    let fonts = FontManager::default();

    let config = render(
        DocumentKind::Confirmation,
        &state,
        &RenderConfig::default(),
        &fonts,
    )
    .unwrap();
    assert_eq!(config.pages.len(), 1);
}

#[test]
fn rendered_boxes_stay_inside_the_page() {
    let state = scenario_state();
    let fonts = FontManager::default();

    for kind in [DocumentKind::Invoice, DocumentKind::Confirmation] {
        let config = render(kind, &state, &RenderConfig::default(), &fonts).unwrap();
        for page in &config.pages {
            for lbox in &page.boxes {
                visit_box(lbox, &mut |b| {
                    assert!(
                        b.x >= 0.0 && b.x < config.page_width_pt,
                        "Box x={} outside page width={}",
                        b.x,
                        config.page_width_pt
                    );
                    assert!(
                        b.y >= 0.0 && b.y < config.page_height_pt,
                        "Box y={} outside page height={}",
                        b.y,
                        config.page_height_pt
                    );
                    assert!(b.width >= 0.0, "Negative width: {}", b.width);
                    assert!(b.height >= 0.0, "Negative height: {}", b.height);
                });
            }
        }
    }
}

#[test]
fn invoice_carries_title_and_locale_formatted_total() {
    let state = scenario_state();
    let fonts = FontManager::default();

    let config = render(DocumentKind::Invoice, &state, &RenderConfig::default(), &fonts).unwrap();
    let text = document_text(&config);

    assert!(text.contains("RECHNUNG"));
    assert!(text.contains("2025-44310"));
    assert!(
        text.contains("31.512,39\u{a0}€"),
        "grand total must use fixed de-DE formatting"
    );
}

#[test]
fn confirmation_cites_the_insolvency_case() {
    let state = scenario_state();
    let fonts = FontManager::default();

    let config = render(
        DocumentKind::Confirmation,
        &state,
        &RenderConfig::default(),
        &fonts,
    )
    .unwrap();
    let text = document_text(&config);

    assert!(text.contains(&state.insolvency.proceeding_nr));
    assert!(text.contains("B2B-BESTÄTIGUNG"));
}

#[test]
fn layout_config_json_round_trip() {
    let state = scenario_state();
    let fonts = FontManager::default();

    let config = render(DocumentKind::Invoice, &state, &RenderConfig::default(), &fonts).unwrap();
    let json = config.to_json();
    let parsed = LayoutConfig::from_json(&json).unwrap();

    assert_eq!(config.pages.len(), parsed.pages.len());
    assert!((config.page_width_pt - parsed.page_width_pt).abs() < 0.01);
}

// =====================================================================
// Export pipeline
// =====================================================================

#[test]
fn export_writes_invoice_pdf_under_documented_name() {
    let dir = tempdir().unwrap();
    let state = scenario_state();
    let pipeline = ExportPipeline::new(FontManager::default());

    // Full A4 geometry, one page.
    let config = ExportConfig {
        out_dir: dir.path().to_path_buf(),
        ..ExportConfig::default()
    };
    let written = pipeline
        .export_document(DocumentKind::Invoice, &state, &config)
        .unwrap();

    assert_eq!(written.path, dir.path().join("Rechnung_2025-44310.pdf"));
    assert_eq!(written.pages, 1);

    let bytes = fs::read(&written.path).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(written.bytes, bytes.len());
}

#[test]
fn multi_page_invoice_exports_every_page() {
    let dir = tempdir().unwrap();
    let mut state = scenario_state();
    state.items = (0..17).map(|i| item(&i.to_string(), 1.0, 50.0)).collect();

    let pipeline = ExportPipeline::new(FontManager::default());
    let written = pipeline
        .export_document(DocumentKind::Invoice, &state, &small_export_config(dir.path()))
        .unwrap();

    assert_eq!(written.pages, 3);
    assert_valid_pdf(&fs::read(&written.path).unwrap());
}

#[test]
fn confirmation_export_uses_its_label() {
    let dir = tempdir().unwrap();
    let state = scenario_state();
    let pipeline = ExportPipeline::new(FontManager::default());

    let written = pipeline
        .export_document(
            DocumentKind::Confirmation,
            &state,
            &small_export_config(dir.path()),
        )
        .unwrap();

    assert_eq!(
        written.path,
        dir.path().join("B2B_Bestätigung_2025-44310.pdf")
    );
    assert_valid_pdf(&fs::read(&written.path).unwrap());
}

// =====================================================================
// Persistence
// =====================================================================

#[test]
fn state_round_trips_through_the_file_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut store = DocumentStore::open(JsonFileStore::at(&path));
    store.update(|state| {
        state.client.name = "Muster Metall GmbH".to_string();
        state.sender_address = String::new(); // falsy, must survive
        state.tax_rate = 0.0; // falsy, must survive
        state.invoice_nr = format!("{}-77001", current_year());
    });

    let reloaded = DocumentStore::open(JsonFileStore::at(&path));
    assert_eq!(reloaded.state().client.name, "Muster Metall GmbH");
    assert_eq!(reloaded.state().sender_address, "");
    assert_eq!(reloaded.state().tax_rate, 0.0);
    assert_eq!(
        reloaded.state().invoice_nr,
        format!("{}-77001", current_year())
    );
}

#[test]
fn corrupt_snapshot_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, ">>> not json <<<").unwrap();

    let store = DocumentStore::open(JsonFileStore::at(&path));
    assert_eq!(store.state().sender_name, "IMPRO Insolvenzverwertung GmbH");
    assert!(!store.state().invoice_nr.is_empty());
}

// =====================================================================
// Extraction
// =====================================================================

#[test]
fn extraction_patch_flows_into_the_store() {
    let backend = MemoryStore::default();
    let mut store = DocumentStore::open(&backend);

    let nr = format!("{}-44310", current_year());
    let mut client = store.state().client.clone();
    client.customer_nr = "44310".to_string();
    let patch = StatePatch {
        client: Some(client),
        invoice_nr: Some(nr.clone()),
        date: Some("11.03.2025".to_string()),
        items: None,
    };
    store.update(|state| patch.apply_to(state));

    assert_eq!(store.state().invoice_nr, nr);
    assert_eq!(store.state().date, "11.03.2025");

    // The merged result is what lands on disk, not the patch alone.
    let reloaded = DocumentStore::open(&backend);
    assert_eq!(reloaded.state().client.customer_nr, "44310");
    assert_eq!(reloaded.state().invoice_nr, nr);
}

#[test]
fn empty_patch_leaves_state_untouched() {
    let mut state = scenario_state();
    let before = state.clone();

    let patch = NullExtractor.extract("Anruf vom Einkauf, bitte prüfen", &state);
    assert!(patch.is_empty());
    patch.apply_to(&mut state);

    assert_eq!(state, before);
}
