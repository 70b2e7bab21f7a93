//! belegwerk – command-line generator for insolvency liquidation documents.
//!
//! Usage:
//!   belegwerk <rechnung|bestaetigung> [--out DIR] [--state FILE] [--import FILE]
//!
//! Document state is loaded from the platform data directory (or the file
//! given with `--state`), optionally enriched by running text extraction
//! over an import file, then the requested document is rendered, captured,
//! and written as `<Label>_<invoiceNr>.pdf` into the output directory.

use std::{env, fs, path::PathBuf, process};

use belegwerk::export::{ExportConfig, ExportPipeline};
use belegwerk::extract::{Extractor, GeminiExtractor};
use belegwerk::fonts::FontManager;
use belegwerk::render::DocumentKind;
use belegwerk::state::{DocumentStore, JsonFileStore};

fn main() {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut kind: Option<DocumentKind> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut state_path: Option<PathBuf> = None;
    let mut import_path: Option<PathBuf> = None;
    let mut capacity: Option<usize> = None;
    let mut scale: Option<f32> = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" | "-o" => match iter.next() {
                Some(v) => out_dir = Some(PathBuf::from(v)),
                None => {
                    eprintln!("--out needs a directory.");
                    print_usage(&args[0]);
                    process::exit(1);
                }
            },
            "--state" | "-s" => match iter.next() {
                Some(v) => state_path = Some(PathBuf::from(v)),
                None => {
                    eprintln!("--state needs a file path.");
                    print_usage(&args[0]);
                    process::exit(1);
                }
            },
            "--import" | "-i" => match iter.next() {
                Some(v) => import_path = Some(PathBuf::from(v)),
                None => {
                    eprintln!("--import needs a file path.");
                    print_usage(&args[0]);
                    process::exit(1);
                }
            },
            "--capacity" => {
                capacity = match iter.next().map(|v| v.parse::<usize>()) {
                    Some(Ok(n)) if n >= 1 => Some(n),
                    _ => {
                        eprintln!("--capacity needs a whole number of at least 1.");
                        print_usage(&args[0]);
                        process::exit(1);
                    }
                }
            }
            "--scale" => {
                scale = match iter.next().map(|v| v.parse::<f32>()) {
                    Some(Ok(f)) if f > 0.0 => Some(f),
                    _ => {
                        eprintln!("--scale needs a positive number.");
                        print_usage(&args[0]);
                        process::exit(1);
                    }
                }
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            word => {
                let parsed = match word.to_lowercase().as_str() {
                    "rechnung" | "invoice" => DocumentKind::Invoice,
                    "bestaetigung" | "bestätigung" | "confirmation" => {
                        DocumentKind::Confirmation
                    }
                    _ => {
                        eprintln!("Unknown document kind: {word}");
                        print_usage(&args[0]);
                        process::exit(1);
                    }
                };
                if kind.replace(parsed).is_some() {
                    eprintln!("Only one document kind per run.");
                    print_usage(&args[0]);
                    process::exit(1);
                }
            }
        }
    }

    let kind = match kind {
        Some(k) => k,
        None => {
            eprintln!("Error: no document kind specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let backend = match state_path {
        Some(path) => JsonFileStore::at(path),
        None => JsonFileStore::new(),
    };
    let mut store = DocumentStore::open(backend);

    if let Some(path) = import_path {
        let text = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading '{}': {e}", path.display());
                process::exit(1);
            }
        };
        let patch = GeminiExtractor::from_env().extract(&text, store.state());
        if patch.is_empty() {
            eprintln!("Nothing extracted from '{}'; state unchanged.", path.display());
        } else {
            store.update(|state| patch.apply_to(state));
        }
    }

    let mut config = ExportConfig::default();
    if let Some(dir) = out_dir {
        config.out_dir = dir;
    }
    if let Some(n) = capacity {
        config.render.items_per_page = n;
    }
    if let Some(f) = scale {
        config.raster_scale = f;
    }

    let pipeline = ExportPipeline::new(FontManager::default());
    match pipeline.export_document(kind, store.state(), &config) {
        Ok(written) => {
            eprintln!(
                "Wrote '{}' ({} bytes, {} page{})",
                written.path.display(),
                written.bytes,
                written.pages,
                if written.pages == 1 { "" } else { "s" }
            );
        }
        Err(e) => {
            eprintln!("Error exporting document: {e}");
            process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("belegwerk – invoice and provenance-confirmation PDF generator");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <rechnung|bestaetigung> [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  rechnung       Sales invoice, paginated over the line items");
    eprintln!("  bestaetigung   Single-page provenance confirmation (B2B)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --out, -o DIR      Output directory (default: current directory)");
    eprintln!("  --state, -s FILE   State snapshot file (default: platform data dir)");
    eprintln!("  --import, -i FILE  Run text extraction over FILE and merge the result");
    eprintln!("  --capacity N       Invoice items per page (default: 8)");
    eprintln!("  --scale F          Raster oversampling factor, floored at 4 (default: 4)");
    eprintln!("  --help             Print this message");
}
