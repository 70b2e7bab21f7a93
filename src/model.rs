//! Entity model – line items, parties, insolvency cases, and the aggregate
//! [`DocumentState`] consumed by the calculator, renderer, and export
//! pipeline.
//!
//! Field names serialize in camelCase to stay wire-compatible with the
//! persisted snapshot format (see [`crate::state`]).

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One priced, quantified entry in an invoice. Items live in an ordered
/// sequence on [`DocumentState`]; order is display order and drives
/// pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Opaque stable id, unique within the item sequence.
    pub id: String,
    pub name: String,
    pub article_nr: String,
    pub quantity: f64,
    /// Unit price in EUR.
    pub unit_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Recipient identity and address fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
    pub name: String,
    pub company: String,
    pub address_line1: String,
    pub address_line2: String,
    pub vat_id: String,
    /// Derived from the invoice-number suffix by convention; divergence is
    /// allowed and never an error (see [`customer_nr_from_invoice_nr`]).
    pub customer_nr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
}

/// An insolvency case record, selected from the preset catalog or
/// hand-edited. `id` is the internal catalog key, distinct from the
/// court-assigned proceeding number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsolvencyData {
    pub id: String,
    pub proceeding_nr: String,
    pub debtor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debtor_address: Option<String>,
    pub court: String,
    pub opening_date: String,
}

/// Issuer contact channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderContact {
    pub phone: String,
    pub web: String,
    pub email: String,
}

/// The escrow (Treuhand) account buyers remit payment to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderBank {
    pub recipient: String,
    pub iban: String,
    pub bic: String,
}

/// Issuer legal registration details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderLegal {
    pub court: String,
    pub hrb: String,
    pub vat_id: String,
    pub ceo: String,
    pub stnr: String,
    pub sitz: String,
}

/// Tax policy switch: domestic sales are taxed, intra-community exports are
/// tax-free regardless of the stored rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxRegion {
    /// Domestic (Germany): the stored tax rate applies.
    De,
    /// Intra-community export: effective rate is forced to zero.
    Eu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Percent,
    Fixed,
}

/// Discount settings. Carried in the model and persisted, but not applied
/// by the total computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
}

/// The aggregate document state: sender profile, client, invoice metadata,
/// ordered line items, insolvency case, and tax settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub sender_name: String,
    pub sender_address: String,
    pub sender_contact: SenderContact,
    pub sender_bank: SenderBank,
    pub sender_legal: SenderLegal,
    pub client: ClientData,
    pub invoice_nr: String,
    /// Display date in DD.MM.YYYY style.
    pub date: String,
    pub due_date: String,
    pub items: Vec<LineItem>,
    pub insolvency: InsolvencyData,
    pub tax_region: TaxRegion,
    pub discount: Discount,
    pub tax_rate: f64,
}

impl DocumentState {
    /// A freshly generated default state: random invoice-number suffix,
    /// today's date, one sample line item, first preset case.
    pub fn generated() -> Self {
        let suffix = random_suffix();
        let presets = insolvency_presets();
        Self {
            sender_name: "IMPRO Insolvenzverwertung GmbH".to_string(),
            sender_address: "Friedrichstraße 123, 10117 Berlin".to_string(),
            sender_contact: SenderContact {
                phone: "030 23324711".to_string(),
                web: "impro-insolvenz.de".to_string(),
                email: "info@impro-insolvenz.de".to_string(),
            },
            sender_bank: SenderBank {
                recipient: "Treuhandkonto IMPRO Insolvenzverwertung".to_string(),
                iban: "DE82 1009 0000 1234 5678 90".to_string(),
                bic: "BEVO DE BB XXX".to_string(),
            },
            sender_legal: SenderLegal {
                court: "Amtsgericht Dresden".to_string(),
                hrb: "HRB 11 904".to_string(),
                vat_id: "DE164313900".to_string(),
                ceo: "Dr. Julian Grafrath".to_string(),
                stnr: "202/111/07023".to_string(),
                sitz: "Dresden".to_string(),
            },
            client: ClientData {
                name: "Max Mustermann".to_string(),
                company: "Musterfirma GmbH".to_string(),
                address_line1: "Musterstraße 123".to_string(),
                address_line2: "10117 Berlin".to_string(),
                vat_id: "DE123456789".to_string(),
                customer_nr: suffix.clone(),
                delivery_address: Some(String::new()),
            },
            invoice_nr: format!("{}-{}", current_year(), suffix),
            date: today_str(),
            due_date: "Sofort".to_string(),
            items: vec![LineItem {
                id: "1".to_string(),
                name: "Viessmann Vitocal 250-A Luft/Wasser-Wärmepumpe, Monoblock, \
                       AWO-E-AC 251.A13 13 kW - Neu"
                    .to_string(),
                article_nr: "INV-1001".to_string(),
                quantity: 7.0,
                unit_price: 3783.0,
                description: Some(String::new()),
                notes: None,
            }],
            insolvency: presets.into_iter().next().unwrap_or_else(|| InsolvencyData {
                id: String::new(),
                proceeding_nr: String::new(),
                debtor_name: String::new(),
                debtor_address: None,
                court: String::new(),
                opening_date: String::new(),
            }),
            tax_region: TaxRegion::De,
            discount: Discount {
                value: 0.0,
                kind: DiscountKind::Percent,
            },
            tax_rate: 0.19,
        }
    }
}

/// Five-digit random suffix used for generated invoice and article numbers.
pub fn random_suffix() -> String {
    rand::thread_rng().gen_range(10_000..100_000).to_string()
}

/// Today's date in the fixed DD.MM.YYYY display style.
pub fn today_str() -> String {
    chrono::Local::now().format("%d.%m.%Y").to_string()
}

/// Current calendar year, used as the invoice-number prefix.
pub fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Local::now().year()
}

/// Derive the customer number from an invoice number.
///
/// The convention is `<year>-<suffix>` → suffix. The split happens at the
/// FIRST `-` only, so `"2025-44-310"` yields `"44-310"`; an invoice number
/// without any `-` is returned whole. Purely a convenience, never enforced:
/// a diverged pair renders as-is.
pub fn customer_nr_from_invoice_nr(invoice_nr: &str) -> &str {
    match invoice_nr.find('-') {
        Some(pos) => &invoice_nr[pos + 1..],
        None => invoice_nr,
    }
}

/// The fixed catalog of insolvency case presets, keyed by internal id.
pub fn insolvency_presets() -> Vec<InsolvencyData> {
    fn case(
        id: &str,
        debtor_name: &str,
        debtor_address: &str,
        court: &str,
        proceeding_nr: &str,
        opening_date: &str,
    ) -> InsolvencyData {
        InsolvencyData {
            id: id.to_string(),
            proceeding_nr: proceeding_nr.to_string(),
            debtor_name: debtor_name.to_string(),
            debtor_address: Some(debtor_address.to_string()),
            court: court.to_string(),
            opening_date: opening_date.to_string(),
        }
    }

    vec![
        case(
            "A-2025",
            "More und Moritz Handels GmbH",
            "c/o Ajay Kumar Chowdhary, Senftenberger Ring 6, 13439 Berlin",
            "Amtsgericht Charlottenburg",
            "3616 IN 10501/25",
            "01.12.2025",
        ),
        case(
            "B-2025",
            "FRuBA Sanitär GmbH i.L.",
            "Reuterstraße 11, 12053 Berlin",
            "Amtsgericht Charlottenburg",
            "3616 IN 3216/25",
            "01.12.2025",
        ),
        case(
            "C-2025",
            "ArrowTec GmbH",
            "Motardstraße 35, 13629 Berlin",
            "Amtsgericht Charlottenburg",
            "3615 IN 10245/25",
            "27.11.2025",
        ),
        case(
            "D-2025",
            "Computer System 2000 GmbH",
            "ehem. Gartenfelder Straße 29-37, 13599 Berlin",
            "Amtsgericht Charlottenburg",
            "3609 IN 4627/25",
            "26.11.2025",
        ),
        case(
            "E-2025",
            "BG Business Group AG i.L.",
            "Hinterbergstraße 17, 6330 Cham, Schweiz",
            "Amtsgericht Ravensburg",
            "20 IN 583/24",
            "05.12.2025",
        ),
        case(
            "F-2025",
            "BSW BodySoulWork GmbH",
            "Riedweg 16, 89081 Ulm",
            "Amtsgericht Ulm",
            "1 IN 281/25",
            "05.12.2025",
        ),
        case(
            "G-2025",
            "KSB Apartments GmbH",
            "Casimir-Katz-Straße 15, 76593 Gernsbach",
            "Amtsgericht Baden-Baden",
            "11 IN 544/25",
            "05.12.2025",
        ),
        case(
            "H-2025",
            "wf-INDUSTRIEBODEN GmbH & Co. KG",
            "Ostener Kuften 20, 89129 Langenau",
            "Amtsgericht Ulm",
            "3 IN 364/25",
            "05.12.2025",
        ),
        case(
            "I-2025",
            "connectNow GmbH",
            "Lohnerhofstraße 2, 78467 Konstanz",
            "Amtsgericht Konstanz",
            "K 42 IN 433/25",
            "02.12.2025",
        ),
        case(
            "J-2025",
            "Süd-Überdachung GmbH",
            "Am Sohlweg 22, 76297 Stutensee",
            "Amtsgericht Karlsruhe",
            "70 IN 1036/25",
            "02.12.2025",
        ),
        case(
            "K-2025",
            "Scirocco Gastronomie GmbH",
            "Lietzenburger Straße 93, 10719 Berlin",
            "Amtsgericht Charlottenburg",
            "3607 IN 10166/25",
            "15.12.2025",
        ),
        case(
            "L-2025",
            "IBS Baugesellschaft mbH",
            "Fürstendamm 64 a, 13465 Berlin",
            "Amtsgericht Charlottenburg",
            "3607 IN 6654/25",
            "05.12.2025",
        ),
        case(
            "M-2025",
            "BEAG Bauelemente- und Baugesellschaft ProjektZWEI mbH",
            "Oberlandstraße 26-35, 12099 Berlin",
            "Amtsgericht Charlottenburg",
            "3609 IN 10583/25",
            "04.12.2025",
        ),
        case(
            "N-2025",
            "Urban Rooftop Construction GmbH i.L.",
            "Soldiner Straße 53, 13359 Berlin",
            "Amtsgericht Charlottenburg",
            "3604 IN 10411/25",
            "28.11.2025",
        ),
    ]
}

/// Look up a preset case by its internal id.
pub fn preset_by_id(id: &str) -> Option<InsolvencyData> {
    insolvency_presets().into_iter().find(|p| p.id == id)
}
