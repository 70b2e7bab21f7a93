//! Free-text extraction collaborator – sends raw text to the Gemini API
//! and turns the structured reply into a partial state patch. Degrades to
//! an empty patch on any problem so extraction can never block editing or
//! rendering.

use serde::Deserialize;

use crate::model::{
    current_year, customer_nr_from_invoice_nr, random_suffix, today_str, ClientData,
    DocumentState, LineItem,
};

const GEMINI_MODEL: &str = "gemini-3-flash-preview";
const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// A partial state update produced by extraction. Present keys replace
/// the corresponding state fields wholesale on apply; `client` already
/// carries the merged result, so applying never consults the extractor
/// again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub client: Option<ClientData>,
    pub invoice_nr: Option<String>,
    pub date: Option<String>,
    pub items: Option<Vec<LineItem>>,
}

impl StatePatch {
    /// True when extraction produced nothing (missing credential or any
    /// failure). Successful extractions always carry at least a date.
    pub fn is_empty(&self) -> bool {
        self.client.is_none()
            && self.invoice_nr.is_none()
            && self.date.is_none()
            && self.items.is_none()
    }

    /// Replace the present keys on `state`.
    pub fn apply_to(self, state: &mut DocumentState) {
        if let Some(client) = self.client {
            state.client = client;
        }
        if let Some(nr) = self.invoice_nr {
            state.invoice_nr = nr;
        }
        if let Some(date) = self.date {
            state.date = date;
        }
        if let Some(items) = self.items {
            state.items = items;
        }
    }
}

/// Extraction seam. Implementations must always return a patch; failures
/// map to an empty patch rather than an error so callers never crash on a
/// bad reply.
pub trait Extractor {
    fn extract(&self, raw_text: &str, state: &DocumentState) -> StatePatch;
}

/// Stand-in used when extraction is disabled; always returns an empty
/// patch.
pub struct NullExtractor;

impl Extractor for NullExtractor {
    fn extract(&self, _raw_text: &str, _state: &DocumentState) -> StatePatch {
        StatePatch::default()
    }
}

/// Shape of the model's JSON reply, mirroring the response schema sent
/// with the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireExtraction {
    client: Option<WireClient>,
    invoice_nr: Option<String>,
    date: Option<String>,
    items: Option<Vec<WireItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireClient {
    name: Option<String>,
    company: Option<String>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    delivery_address: Option<String>,
    vat_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireItem {
    name: Option<String>,
    article_nr: Option<String>,
    quantity: Option<f64>,
    unit_price: Option<f64>,
    notes: Option<String>,
}

fn merge_client(current: &ClientData, wire: WireClient) -> ClientData {
    let mut client = current.clone();
    if let Some(v) = wire.name {
        client.name = v;
    }
    if let Some(v) = wire.company {
        client.company = v;
    }
    if let Some(v) = wire.address_line1 {
        client.address_line1 = v;
    }
    if let Some(v) = wire.address_line2 {
        client.address_line2 = v;
    }
    if let Some(v) = wire.delivery_address {
        client.delivery_address = Some(v);
    }
    if let Some(v) = wire.vat_id {
        client.vat_id = v;
    }
    client
}

fn import_item(idx: usize, stamp: u128, wire: WireItem) -> LineItem {
    LineItem {
        id: format!("imported-{idx}-{stamp}"),
        name: wire
            .name
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Position".to_string()),
        article_nr: wire
            .article_nr
            .filter(|s| !s.is_empty())
            .unwrap_or_else(random_suffix),
        quantity: match wire.quantity {
            Some(q) if q != 0.0 => q,
            _ => 1.0,
        },
        unit_price: wire.unit_price.unwrap_or(0.0),
        description: None,
        notes: wire.notes.filter(|s| !s.is_empty()),
    }
}

fn millis_now() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Turn a model reply into an apply-ready patch against `state`.
fn build_patch(wire: WireExtraction, state: &DocumentState) -> StatePatch {
    let mut patch = StatePatch::default();

    if let Some(client) = wire.client {
        patch.client = Some(merge_client(&state.client, client));
    }

    if let Some(nr) = wire.invoice_nr.filter(|nr| !nr.is_empty()) {
        // Keep the customer number in sync when the extracted number
        // follows the <year>-<suffix> convention.
        if nr.starts_with(&format!("{}-", current_year())) {
            let mut client = patch
                .client
                .take()
                .unwrap_or_else(|| state.client.clone());
            client.customer_nr = customer_nr_from_invoice_nr(&nr).to_string();
            patch.client = Some(client);
        }
        patch.invoice_nr = Some(nr);
    }

    patch.date = Some(wire.date.filter(|d| !d.is_empty()).unwrap_or_else(today_str));

    if let Some(items) = wire.items {
        let stamp = millis_now();
        patch.items = Some(
            items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| import_item(idx, stamp, item))
                .collect(),
        );
    }

    patch
}

/// Gemini-backed extractor. Reads the API key from `GEMINI_API_KEY` (or
/// `API_KEY`) and silently no-ops when neither is set.
pub struct GeminiExtractor {
    api_key: Option<String>,
    model: String,
}

impl GeminiExtractor {
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.is_empty());
        Self {
            api_key,
            model: GEMINI_MODEL.to_string(),
        }
    }

    fn request(&self, key: &str, raw_text: &str) -> Result<WireExtraction, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| e.to_string())?;

        let url = format!("{GEMINI_ENDPOINT}/{}:generateContent?key={key}", self.model);
        let response = client
            .post(&url)
            .json(&request_body(raw_text))
            .send()
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(format!("model endpoint returned {status}: {body}"));
        }

        let reply: GenerateContentReply = response.json().map_err(|e| e.to_string())?;
        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "{}".to_string());
        serde_json::from_str(&text).map_err(|e| format!("unparseable model reply: {e}"))
    }
}

impl Extractor for GeminiExtractor {
    fn extract(&self, raw_text: &str, state: &DocumentState) -> StatePatch {
        let Some(key) = self.api_key.as_deref() else {
            log::warn!("no API key configured; extraction skipped");
            return StatePatch::default();
        };
        match self.request(key, raw_text) {
            Ok(wire) => build_patch(wire, state),
            Err(e) => {
                log::warn!("text extraction failed: {e}");
                StatePatch::default()
            }
        }
    }
}

fn request_body(raw_text: &str) -> serde_json::Value {
    let system_instruction = format!(
        "You are a data extraction expert for a German legal/invoice system.\n\
         Extract the following entities from the unstructured text provided:\n\
         1. Client details (Name, Company, Address, Delivery Address if different, VAT ID).\n\
         2. Invoice Items (Name, Article Number, Price, Quantity, Notes/Accessories).\n\
         3. Invoice Metadata (Invoice Number, Date).\n\n\
         If a field is not found, leave it null.\n\
         Prices should be extracted as numbers (e.g. 1000.00).\n\
         Dates should be strictly in DD.MM.YYYY format. Use {today} if no date is found.",
        today = today_str()
    );

    serde_json::json!({
        "systemInstruction": { "parts": [{ "text": system_instruction }] },
        "contents": [{
            "parts": [{ "text": format!("Extract data from this text:\n\n{raw_text}") }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "client": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "company": { "type": "STRING" },
                            "addressLine1": { "type": "STRING" },
                            "addressLine2": { "type": "STRING" },
                            "deliveryAddress": { "type": "STRING" },
                            "vatId": { "type": "STRING" }
                        }
                    },
                    "invoiceNr": { "type": "STRING" },
                    "date": { "type": "STRING" },
                    "items": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "name": { "type": "STRING" },
                                "articleNr": { "type": "STRING" },
                                "quantity": { "type": "NUMBER" },
                                "unitPrice": { "type": "NUMBER" },
                                "notes": { "type": "STRING" }
                            }
                        }
                    }
                }
            }
        }
    })
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentReply {
    #[serde(default)]
    candidates: Vec<ReplyCandidate>,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyCandidate {
    #[serde(default)]
    content: ReplyContent,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(json: &str) -> WireExtraction {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn year_prefixed_invoice_nr_syncs_customer_nr() {
        let state = DocumentState::generated();
        let json = format!(r#"{{"invoiceNr":"{}-44310"}}"#, current_year());
        let patch = build_patch(wire(&json), &state);

        assert_eq!(
            patch.invoice_nr.as_deref(),
            Some(format!("{}-44310", current_year()).as_str())
        );
        assert_eq!(patch.client.unwrap().customer_nr, "44310");
    }

    #[test]
    fn foreign_invoice_nr_leaves_customer_nr_alone() {
        let state = DocumentState::generated();
        let patch = build_patch(wire(r#"{"invoiceNr":"RG-2020-7"}"#), &state);

        assert_eq!(patch.invoice_nr.as_deref(), Some("RG-2020-7"));
        assert!(patch.client.is_none());
    }

    #[test]
    fn date_falls_back_to_today() {
        let state = DocumentState::generated();

        let patch = build_patch(wire("{}"), &state);
        assert_eq!(patch.date, Some(today_str()));

        let patch = build_patch(wire(r#"{"date":""}"#), &state);
        assert_eq!(patch.date, Some(today_str()));

        let patch = build_patch(wire(r#"{"date":"01.02.2031"}"#), &state);
        assert_eq!(patch.date.as_deref(), Some("01.02.2031"));
    }

    #[test]
    fn client_fields_merge_onto_current() {
        let mut state = DocumentState::generated();
        state.client.name = "Alt GmbH".to_string();
        state.client.company = "Bestand".to_string();
        state.client.vat_id = "DE111".to_string();

        let patch = build_patch(
            wire(r#"{"client":{"name":"Neu AG","vatId":"DE999"}}"#),
            &state,
        );
        let client = patch.client.unwrap();

        assert_eq!(client.name, "Neu AG");
        assert_eq!(client.vat_id, "DE999");
        assert_eq!(client.company, "Bestand");
    }

    #[test]
    fn imported_items_get_fresh_ids_and_defaults() {
        let state = DocumentState::generated();
        let patch = build_patch(
            wire(r#"{"items":[{"name":"Drehbank","unitPrice":1200.5},{}]}"#),
            &state,
        );
        let items = patch.items.unwrap();

        assert_eq!(items.len(), 2);
        assert!(items[0].id.starts_with("imported-0-"));
        assert!(items[1].id.starts_with("imported-1-"));
        assert_eq!(items[0].name, "Drehbank");
        assert_eq!(items[0].unit_price, 1200.5);
        assert_eq!(items[0].quantity, 1.0);
        assert_eq!(items[1].name, "Position");
        assert_eq!(items[1].unit_price, 0.0);
        assert_eq!(items[1].article_nr.len(), 5);
        assert!(items[1].article_nr.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn zero_quantity_defaults_to_one() {
        let state = DocumentState::generated();
        let patch = build_patch(wire(r#"{"items":[{"quantity":0}]}"#), &state);
        assert_eq!(patch.items.unwrap()[0].quantity, 1.0);
    }

    #[test]
    fn present_empty_item_list_replaces_items() {
        let state = DocumentState::generated();
        let patch = build_patch(wire(r#"{"items":[]}"#), &state);
        assert_eq!(patch.items, Some(Vec::new()));
    }

    #[test]
    fn apply_replaces_only_present_keys() {
        let mut state = DocumentState::generated();
        let kept_date = state.date.clone();
        let kept_items = state.items.clone();

        let patch = StatePatch {
            invoice_nr: Some("2030-1".to_string()),
            ..StatePatch::default()
        };
        patch.apply_to(&mut state);

        assert_eq!(state.invoice_nr, "2030-1");
        assert_eq!(state.date, kept_date);
        assert_eq!(state.items, kept_items);
    }

    #[test]
    fn null_extractor_returns_empty_patch() {
        let state = DocumentState::generated();
        let patch = NullExtractor.extract("irgendein Text", &state);
        assert!(patch.is_empty());
    }

    #[test]
    fn reply_envelope_parses() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"invoiceNr\":\"2025-1\"}"}]}}]}"#;
        let reply: GenerateContentReply = serde_json::from_str(raw).unwrap();
        let text = &reply.candidates[0].content.parts[0].text;
        let wire: WireExtraction = serde_json::from_str(text).unwrap();
        assert_eq!(wire.invoice_nr.as_deref(), Some("2025-1"));
    }
}
