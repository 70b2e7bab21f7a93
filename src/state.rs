//! Document data store – snapshot persistence with shallow merge onto
//! freshly generated defaults, and silent fallback when stored data is
//! missing or unreadable.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::model::{
    ClientData, Discount, DocumentState, InsolvencyData, LineItem, SenderBank, SenderContact,
    SenderLegal, TaxRegion,
};

/// Storage key; doubles as the file stem for file-backed persistence.
pub const STATE_KEY: &str = "impro_insolvenz_state_v1";

/// A persisted document state. Every field is optional so snapshots
/// written by older versions merge onto current defaults key by key: a
/// present key wins wholesale, a missing key keeps the generated default.
/// Presence is what counts, never the value, so empty strings and zeros
/// survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_contact: Option<SenderContact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_bank: Option<SenderBank>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_legal: Option<SenderLegal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_nr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<LineItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insolvency: Option<InsolvencyData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_region: Option<TaxRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,
}

impl Snapshot {
    /// Capture the full state.
    pub fn of(state: &DocumentState) -> Self {
        Self {
            sender_name: Some(state.sender_name.clone()),
            sender_address: Some(state.sender_address.clone()),
            sender_contact: Some(state.sender_contact.clone()),
            sender_bank: Some(state.sender_bank.clone()),
            sender_legal: Some(state.sender_legal.clone()),
            client: Some(state.client.clone()),
            invoice_nr: Some(state.invoice_nr.clone()),
            date: Some(state.date.clone()),
            due_date: Some(state.due_date.clone()),
            items: Some(state.items.clone()),
            insolvency: Some(state.insolvency.clone()),
            tax_region: Some(state.tax_region),
            discount: Some(state.discount.clone()),
            tax_rate: Some(state.tax_rate),
        }
    }

    /// Shallow-merge onto `base`: present keys replace whole values.
    pub fn merge_onto(self, mut base: DocumentState) -> DocumentState {
        if let Some(v) = self.sender_name {
            base.sender_name = v;
        }
        if let Some(v) = self.sender_address {
            base.sender_address = v;
        }
        if let Some(v) = self.sender_contact {
            base.sender_contact = v;
        }
        if let Some(v) = self.sender_bank {
            base.sender_bank = v;
        }
        if let Some(v) = self.sender_legal {
            base.sender_legal = v;
        }
        if let Some(v) = self.client {
            base.client = v;
        }
        if let Some(v) = self.invoice_nr {
            base.invoice_nr = v;
        }
        if let Some(v) = self.date {
            base.date = v;
        }
        if let Some(v) = self.due_date {
            base.due_date = v;
        }
        if let Some(v) = self.items {
            base.items = v;
        }
        if let Some(v) = self.insolvency {
            base.insolvency = v;
        }
        if let Some(v) = self.tax_region {
            base.tax_region = v;
        }
        if let Some(v) = self.discount {
            base.discount = v;
        }
        if let Some(v) = self.tax_rate {
            base.tax_rate = v;
        }
        base
    }
}

/// Storage backend seam. Both operations are best-effort: `load` returns
/// `None` for missing or unusable data, `save` swallows failures after
/// logging them.
pub trait Persistence {
    fn load(&self) -> Option<Snapshot>;
    fn save(&self, snapshot: &Snapshot);
}

impl<P: Persistence + ?Sized> Persistence for &P {
    fn load(&self) -> Option<Snapshot> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) {
        (**self).save(snapshot)
    }
}

/// Snapshot file under the platform data directory, e.g.
/// `~/.local/share/belegwerk/impro_insolvenz_state_v1.json`.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("belegwerk").join(format!("{STATE_KEY}.json")),
        }
    }

    /// Store the snapshot at an explicit path instead.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Persistence for JsonFileStore {
    fn load(&self) -> Option<Snapshot> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                log::warn!(
                    "ignoring unreadable state snapshot at {}: {e}",
                    self.path.display()
                );
                None
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) {
        let json = match serde_json::to_string_pretty(snapshot) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("state snapshot serialization failed: {e}");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("cannot create state directory {}: {e}", parent.display());
                return;
            }
        }
        if let Err(e) = fs::write(&self.path, json) {
            log::warn!("cannot write state snapshot {}: {e}", self.path.display());
        }
    }
}

/// In-memory persistence for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Snapshot>>,
}

impl Persistence for MemoryStore {
    fn load(&self) -> Option<Snapshot> {
        self.slot.lock().ok()?.clone()
    }

    fn save(&self, snapshot: &Snapshot) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(snapshot.clone());
        }
    }
}

/// Owns the working state and mirrors every change to the backend.
pub struct DocumentStore<P: Persistence> {
    backend: P,
    state: DocumentState,
}

impl<P: Persistence> DocumentStore<P> {
    /// Load the saved snapshot merged onto a freshly generated state, or
    /// plain defaults when nothing usable is stored.
    pub fn open(backend: P) -> Self {
        let state = match backend.load() {
            Some(snapshot) => snapshot.merge_onto(DocumentState::generated()),
            None => DocumentState::generated(),
        };
        Self { backend, state }
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// Replace the whole state.
    pub fn replace(&mut self, state: DocumentState) {
        self.state = state;
        self.persist();
    }

    /// Mutate in place and persist the result.
    pub fn update(&mut self, mutate: impl FnOnce(&mut DocumentState)) {
        mutate(&mut self.state);
        self.persist();
    }

    fn persist(&self) {
        self.backend.save(&Snapshot::of(&self.state));
    }
}
