//! Document templates – build the styled node tree for each page of the
//! two document kinds (Rechnung and B2B-Bestätigung) from the document
//! state.
//!
//! All strings, colors, and spacing are fixed; the only variable inputs
//! are the state fields. Sizes are in PDF points (CSS px × 0.75).

use crate::model::DocumentState;
use crate::pagination::ItemPage;
use crate::style::{
    AlignItems, BlockStyle, Color, Dimension, JustifyContent, StyledNode, TextAlign,
};
use crate::totals::{compute_totals, effective_tax_rate, format_eur};

// Slate ramp plus the brand gold.
const SLATE_800: Color = Color::rgb8(0x1e, 0x29, 0x3b);
const SLATE_700: Color = Color::rgb8(0x33, 0x41, 0x55);
const SLATE_600: Color = Color::rgb8(0x47, 0x55, 0x69);
const SLATE_500: Color = Color::rgb8(0x64, 0x74, 0x8b);
const SLATE_400: Color = Color::rgb8(0x94, 0xa3, 0xb8);
const SLATE_200: Color = Color::rgb8(0xe2, 0xe8, 0xf0);
const SLATE_100: Color = Color::rgb8(0xf1, 0xf5, 0xf9);
const PANEL_BG: Color = Color::rgb8(0xf8, 0xf9, 0xfa);
pub const BRAND_GOLD: Color = Color::rgb8(0xc9, 0xa2, 0x27);

const HAIRLINE: f32 = 0.75;

fn txt(size: f32, color: Color) -> BlockStyle {
    BlockStyle {
        font_size: size,
        color,
        ..BlockStyle::default()
    }
}

fn bold(size: f32, color: Color) -> BlockStyle {
    BlockStyle {
        bold: true,
        ..txt(size, color)
    }
}

/// One page of the sales invoice.
pub fn invoice_page(state: &DocumentState, page: &ItemPage<'_>) -> StyledNode {
    let mut body_children = Vec::new();

    if page.is_first {
        body_children.push(meta_row(state));
    }
    if !page.items.is_empty() {
        body_children.push(items_table(page));
    }
    if page.has_totals {
        body_children.push(totals_and_legal(state));
    }

    StyledNode::block(
        BlockStyle::column(),
        vec![
            header(true),
            StyledNode::block(
                BlockStyle {
                    flex_grow: 1.0,
                    ..BlockStyle::column()
                },
                body_children,
            ),
            footer(state),
        ],
    )
}

/// The provenance confirmation is always a single page.
pub fn confirmation_page(state: &DocumentState) -> StyledNode {
    StyledNode::block(
        BlockStyle::column(),
        vec![
            header(false),
            confirmation_meta_row(state),
            confirmation_body(state),
            footer(state),
        ],
    )
}

/// Brand row: shield, wordmark, and (for invoices) the document title.
fn header(show_title: bool) -> StyledNode {
    let mut children = vec![StyledNode::block(
        BlockStyle {
            align_items: AlignItems::Center,
            ..BlockStyle::row()
        },
        vec![
            StyledNode::block(
                BlockStyle {
                    width: Dimension::Pt(42.0),
                    height: Dimension::Pt(42.0),
                    margin_right: 12.0,
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    ..BlockStyle::row()
                },
                vec![StyledNode::logo(
                    BlockStyle {
                        width: Dimension::Pt(30.0),
                        height: Dimension::Pt(30.0),
                        ..BlockStyle::default()
                    },
                    BRAND_GOLD,
                )],
            ),
            StyledNode::block(
                BlockStyle::column(),
                vec![
                    StyledNode::text(
                        BlockStyle {
                            line_height: 1.0,
                            ..bold(27.0, SLATE_800)
                        },
                        "IMPRO",
                    ),
                    StyledNode::text(
                        BlockStyle {
                            margin_top: 3.0,
                            ..bold(9.0, SLATE_500)
                        },
                        "Insolvenzverwertung GmbH",
                    ),
                ],
            ),
        ],
    )];

    if show_title {
        children.push(StyledNode::text(
            BlockStyle {
                text_align: TextAlign::Right,
                ..bold(27.0, SLATE_800)
            },
            "RECHNUNG",
        ));
    }

    StyledNode::block(
        BlockStyle {
            justify_content: JustifyContent::SpaceBetween,
            align_items: AlignItems::Start,
            margin_bottom: 24.0,
            ..BlockStyle::row()
        },
        children,
    )
}

/// Split "Street, City" into its two footer lines. Tolerates a missing
/// comma by leaving the second line empty.
fn address_parts(address: &str) -> (String, String) {
    match address.split_once(',') {
        Some((street, city)) => (street.trim().to_string(), city.trim().to_string()),
        None => (address.trim().to_string(), String::new()),
    }
}

fn footer_column(weight: f32, heading: &str, lines: Vec<String>) -> StyledNode {
    let mut children = vec![StyledNode::text(
        BlockStyle {
            margin_bottom: 3.0,
            ..bold(6.75, SLATE_700)
        },
        heading,
    )];
    for line in lines {
        children.push(StyledNode::text(txt(6.75, SLATE_500), line));
    }
    StyledNode::block(
        BlockStyle {
            flex_grow: weight,
            flex_basis: Dimension::Pt(0.0),
            ..BlockStyle::column()
        },
        children,
    )
}

/// Four-column footer shared by both document kinds.
fn footer(state: &DocumentState) -> StyledNode {
    let (street, city) = address_parts(&state.sender_address);

    let brand_column = StyledNode::block(
        BlockStyle {
            flex_grow: 0.5,
            flex_basis: Dimension::Pt(0.0),
            align_items: AlignItems::End,
            justify_content: JustifyContent::Center,
            ..BlockStyle::column()
        },
        vec![
            StyledNode::logo(
                BlockStyle {
                    width: Dimension::Pt(30.0),
                    height: Dimension::Pt(30.0),
                    ..BlockStyle::default()
                },
                BRAND_GOLD,
            ),
            StyledNode::text(
                BlockStyle {
                    margin_top: 3.0,
                    ..bold(5.25, BRAND_GOLD)
                },
                "IMPRO",
            ),
        ],
    );

    StyledNode::block(
        BlockStyle {
            padding_top: 18.0,
            border_top: HAIRLINE,
            border_color: SLATE_200,
            gap: 24.0,
            ..BlockStyle::row()
        },
        vec![
            footer_column(
                1.2,
                &state.sender_name,
                vec![street, city, "Deutschland".to_string()],
            ),
            footer_column(
                1.0,
                "Kontakt",
                vec![
                    format!("Tel: {}", state.sender_contact.phone),
                    format!("Web: {}", state.sender_contact.web),
                    format!("E-Mail: {}", state.sender_contact.email),
                ],
            ),
            footer_column(
                1.2,
                "Firmengericht",
                vec![
                    state.sender_legal.court.clone(),
                    state.sender_legal.hrb.clone(),
                    format!("USt-IdNr.: {}", state.sender_legal.vat_id),
                ],
            ),
            brand_column,
        ],
    )
}

/// Sender line plus recipient address.
fn address_block(state: &DocumentState) -> StyledNode {
    let mut recipient = vec![StyledNode::text(
        BlockStyle {
            line_height: 1.375,
            ..bold(9.75, SLATE_800)
        },
        state.client.name.clone(),
    )];
    if !state.client.company.is_empty() {
        recipient.push(StyledNode::text(
            BlockStyle {
                line_height: 1.375,
                ..txt(9.75, SLATE_800)
            },
            state.client.company.clone(),
        ));
    }
    recipient.push(StyledNode::text(
        BlockStyle {
            line_height: 1.375,
            ..txt(9.75, SLATE_800)
        },
        state.client.address_line1.clone(),
    ));
    recipient.push(StyledNode::text(
        BlockStyle {
            line_height: 1.375,
            ..txt(9.75, SLATE_800)
        },
        state.client.address_line2.clone(),
    ));
    if !state.client.vat_id.is_empty() {
        recipient.push(StyledNode::text(
            BlockStyle {
                margin_top: 3.0,
                line_height: 1.375,
                ..txt(9.75, SLATE_800)
            },
            format!("USt-IdNr.: {}", state.client.vat_id),
        ));
    }

    StyledNode::block(
        BlockStyle {
            margin_bottom: 30.0,
            align_items: AlignItems::Start,
            ..BlockStyle::column()
        },
        vec![
            StyledNode::block(
                BlockStyle {
                    border_bottom: HAIRLINE,
                    border_color: SLATE_100,
                    padding_bottom: 3.0,
                    margin_bottom: 9.0,
                    ..BlockStyle::column()
                },
                vec![StyledNode::text(
                    txt(6.75, SLATE_400),
                    format!("{} • {}", state.sender_name, state.sender_address),
                )],
            ),
            StyledNode::block(BlockStyle::column(), recipient),
        ],
    )
}

/// Label/value row used in the first-page invoice meta table.
fn meta_line(label: &str, value: String) -> StyledNode {
    StyledNode::block(
        BlockStyle {
            gap: 12.0,
            ..BlockStyle::row()
        },
        vec![
            StyledNode::block(
                BlockStyle {
                    flex_grow: 1.2,
                    flex_basis: Dimension::Pt(0.0),
                    ..BlockStyle::column()
                },
                vec![StyledNode::text(bold(8.25, SLATE_700), label)],
            ),
            StyledNode::block(
                BlockStyle {
                    flex_grow: 1.0,
                    flex_basis: Dimension::Pt(0.0),
                    ..BlockStyle::column()
                },
                vec![StyledNode::text(
                    BlockStyle {
                        text_align: TextAlign::Right,
                        ..txt(8.25, SLATE_600)
                    },
                    value,
                )],
            ),
        ],
    )
}

/// First invoice page only: recipient address left, invoice metadata right.
fn meta_row(state: &DocumentState) -> StyledNode {
    StyledNode::block(
        BlockStyle {
            justify_content: JustifyContent::SpaceBetween,
            align_items: AlignItems::Start,
            margin_bottom: 18.0,
            ..BlockStyle::row()
        },
        vec![
            StyledNode::block(
                BlockStyle {
                    width: Dimension::Percent(60.0),
                    ..BlockStyle::column()
                },
                vec![address_block(state)],
            ),
            StyledNode::block(
                BlockStyle {
                    width: Dimension::Percent(30.0),
                    padding_top: 24.0,
                    gap: 4.5,
                    ..BlockStyle::column()
                },
                vec![
                    meta_line("Rechnungs-Nr.:", state.invoice_nr.clone()),
                    meta_line("Datum:", state.date.clone()),
                    meta_line(
                        "Kundennummer:",
                        format!("KD-{}", state.client.customer_nr),
                    ),
                    meta_line("Fälligkeit:", "Sofort".to_string()),
                ],
            ),
        ],
    )
}

/// Integral quantities print without a fraction part.
fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 && quantity.abs() < 1e15 {
        format!("{}", quantity as i64)
    } else {
        format!("{quantity}")
    }
}

fn table_cell(width: Dimension, padding_y: f32, content: Vec<StyledNode>) -> StyledNode {
    let (grow, basis) = match width {
        Dimension::Auto => (1.0, Dimension::Pt(0.0)),
        _ => (0.0, Dimension::Auto),
    };
    StyledNode::block(
        BlockStyle {
            width,
            flex_grow: grow,
            flex_basis: basis,
            padding_top: padding_y,
            padding_bottom: padding_y,
            padding_left: 12.0,
            padding_right: 12.0,
            ..BlockStyle::column()
        },
        content,
    )
}

fn header_cell(label: &str, align: TextAlign, width: Dimension) -> StyledNode {
    table_cell(
        width,
        9.0,
        vec![StyledNode::text(
            BlockStyle {
                text_align: align,
                ..bold(8.25, SLATE_700)
            },
            label,
        )],
    )
}

/// The line-item table for one page slice.
fn items_table(page: &ItemPage<'_>) -> StyledNode {
    let header_row = StyledNode::block(
        BlockStyle {
            background: PANEL_BG,
            border_bottom: HAIRLINE,
            border_color: SLATE_200,
            ..BlockStyle::row()
        },
        vec![
            header_cell(
                "Produkt & Beschreibung",
                TextAlign::Left,
                Dimension::Percent(55.0),
            ),
            header_cell("Einzelpreis (€)", TextAlign::Right, Dimension::Auto),
            header_cell("Menge", TextAlign::Center, Dimension::Auto),
            header_cell("Gesamtpreis (€)", TextAlign::Right, Dimension::Auto),
        ],
    );

    let mut rows = vec![header_row];
    for (i, item) in page.items.iter().enumerate() {
        let mut product = vec![StyledNode::text(
            bold(8.25, SLATE_800),
            item.name.clone(),
        )];
        if let Some(description) = &item.description {
            if !description.is_empty() {
                product.push(StyledNode::text(
                    BlockStyle {
                        margin_top: 3.0,
                        ..txt(6.75, SLATE_500)
                    },
                    description.clone(),
                ));
            }
        }
        product.push(StyledNode::text(
            BlockStyle {
                margin_top: 3.0,
                ..txt(6.75, SLATE_400)
            },
            format!("Art.-Nr: {}", item.article_nr),
        ));

        let row_style = BlockStyle {
            border_top: if i > 0 { HAIRLINE } else { 0.0 },
            border_color: SLATE_100,
            align_items: AlignItems::Start,
            ..BlockStyle::row()
        };
        rows.push(StyledNode::block(
            row_style,
            vec![
                table_cell(Dimension::Percent(55.0), 12.0, product),
                table_cell(
                    Dimension::Auto,
                    12.0,
                    vec![StyledNode::text(
                        BlockStyle {
                            text_align: TextAlign::Right,
                            ..txt(8.25, SLATE_600)
                        },
                        format_eur(item.unit_price),
                    )],
                ),
                table_cell(
                    Dimension::Auto,
                    12.0,
                    vec![StyledNode::text(
                        BlockStyle {
                            text_align: TextAlign::Center,
                            ..txt(8.25, SLATE_600)
                        },
                        format_quantity(item.quantity),
                    )],
                ),
                table_cell(
                    Dimension::Auto,
                    12.0,
                    vec![StyledNode::text(
                        BlockStyle {
                            text_align: TextAlign::Right,
                            ..bold(8.25, SLATE_800)
                        },
                        format_eur(item.unit_price * item.quantity),
                    )],
                ),
            ],
        ));
    }

    StyledNode::block(
        BlockStyle {
            margin_bottom: 18.0,
            border_top: HAIRLINE,
            border_right: HAIRLINE,
            border_bottom: HAIRLINE,
            border_left: HAIRLINE,
            border_color: SLATE_100,
            ..BlockStyle::column()
        },
        rows,
    )
}

/// Effective tax rate rendered as a percent label, e.g. "19%".
fn format_tax_percent(rate: f64) -> String {
    let pct = rate * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{}%", pct.round() as i64)
    } else {
        format!("{pct}%")
    }
}

fn totals_line(label: &str, amount: String) -> StyledNode {
    StyledNode::block(
        BlockStyle {
            justify_content: JustifyContent::SpaceBetween,
            ..BlockStyle::row()
        },
        vec![
            StyledNode::text(txt(8.25, SLATE_500), label),
            StyledNode::text(bold(8.25, SLATE_800), amount),
        ],
    )
}

fn paragraph_group(gap: f32, lines: Vec<StyledNode>) -> StyledNode {
    StyledNode::block(
        BlockStyle {
            gap,
            ..BlockStyle::column()
        },
        lines,
    )
}

fn legal_line(text: String) -> StyledNode {
    StyledNode::text(
        BlockStyle {
            line_height: 1.625,
            ..txt(7.5, SLATE_700)
        },
        text,
    )
}

/// Last invoice page: payment terms and legal text left, totals panel right.
fn totals_and_legal(state: &DocumentState) -> StyledNode {
    let totals = compute_totals(&state.items, state.tax_region, state.tax_rate);
    let rate = effective_tax_rate(state.tax_region, state.tax_rate);

    let delivery_kind = match state.tax_region {
        crate::model::TaxRegion::De => "Inländische Lieferung",
        crate::model::TaxRegion::Eu => "Innergemeinschaftliche Lieferung (steuerfrei)",
    };

    let left = StyledNode::block(
        BlockStyle {
            width: Dimension::Percent(55.0),
            gap: 9.0,
            ..BlockStyle::column()
        },
        vec![
            paragraph_group(
                1.5,
                vec![
                    legal_line("Lieferdatum: entspricht Rechnungsdatum".to_string()),
                    legal_line(
                        "Zahlungsziel: Zahlung per Treuhandkonto – sofort fällig".to_string(),
                    ),
                    legal_line(format!("Leistungsart: {delivery_kind}")),
                ],
            ),
            paragraph_group(
                1.5,
                vec![
                    legal_line(
                        "Der Verkauf erfolgt im Rahmen des Insolvenzverfahrens gemäß § 159 InsO."
                            .to_string(),
                    ),
                    legal_line(
                        "Die gelieferten Waren bleiben bis zur vollständigen Bezahlung gemäß \
                         § 449 BGB Eigentum der Insolvenzmasse."
                            .to_string(),
                    ),
                    legal_line(
                        "Ein Rückgaberecht von 14 Tagen ab Erhalt der Ware wird eingeräumt."
                            .to_string(),
                    ),
                ],
            ),
            StyledNode::block(
                BlockStyle {
                    padding_top: 3.0,
                    ..BlockStyle::column()
                },
                vec![
                    StyledNode::text(
                        BlockStyle {
                            margin_bottom: 3.0,
                            line_height: 1.625,
                            ..bold(7.5, SLATE_700)
                        },
                        "Bitte überweisen Sie den Rechnungsbetrag auf das Treuhandkonto des \
                         Gläubigers gemäß § 80 Abs. 1 InsO.",
                    ),
                    legal_line(format!("Empfänger: {}", state.sender_bank.recipient)),
                    legal_line(format!("IBAN: {}", state.sender_bank.iban)),
                    legal_line(format!("BIC: {}", state.sender_bank.bic)),
                    legal_line(format!("Bearbeitet von: {}", state.sender_legal.ceo)),
                ],
            ),
        ],
    );

    let grand_total_row = StyledNode::block(
        BlockStyle {
            justify_content: JustifyContent::SpaceBetween,
            padding_top: 9.0,
            border_top: HAIRLINE,
            border_color: SLATE_200,
            ..BlockStyle::row()
        },
        vec![
            StyledNode::text(bold(10.5, SLATE_800), "Gesamtbetrag"),
            StyledNode::text(bold(10.5, SLATE_800), format_eur(totals.total)),
        ],
    );

    let right = StyledNode::block(
        BlockStyle {
            width: Dimension::Percent(40.0),
            ..BlockStyle::column()
        },
        vec![StyledNode::block(
            BlockStyle {
                background: PANEL_BG,
                corner_radius: 1.5,
                padding_top: 12.0,
                padding_right: 12.0,
                padding_bottom: 12.0,
                padding_left: 12.0,
                gap: 6.0,
                ..BlockStyle::column()
            },
            vec![
                totals_line("Zwischensumme (netto)", format_eur(totals.subtotal)),
                totals_line(
                    &format!("Umsatzsteuer ({})", format_tax_percent(rate)),
                    format_eur(totals.tax),
                ),
                grand_total_row,
            ],
        )],
    );

    StyledNode::block(
        BlockStyle {
            justify_content: JustifyContent::SpaceBetween,
            align_items: AlignItems::Start,
            gap: 30.0,
            margin_top: 6.0,
            ..BlockStyle::row()
        },
        vec![left, right],
    )
}

/// Bold label plus plain value, right-aligned as a unit.
fn case_meta_line(label: &str, value: String) -> StyledNode {
    StyledNode::block(
        BlockStyle {
            justify_content: JustifyContent::End,
            gap: 3.0,
            ..BlockStyle::row()
        },
        vec![
            StyledNode::text(bold(8.25, SLATE_800), label),
            StyledNode::text(txt(8.25, SLATE_800), value),
        ],
    )
}

/// Confirmation head: recipient address left, case reference right.
fn confirmation_meta_row(state: &DocumentState) -> StyledNode {
    StyledNode::block(
        BlockStyle {
            justify_content: JustifyContent::SpaceBetween,
            align_items: AlignItems::Start,
            margin_bottom: 24.0,
            ..BlockStyle::row()
        },
        vec![
            StyledNode::block(
                BlockStyle {
                    width: Dimension::Percent(60.0),
                    ..BlockStyle::column()
                },
                vec![address_block(state)],
            ),
            StyledNode::block(
                BlockStyle {
                    width: Dimension::Percent(35.0),
                    padding_top: 18.0,
                    gap: 3.0,
                    ..BlockStyle::column()
                },
                vec![
                    case_meta_line("Aktenzeichen:", state.insolvency.proceeding_nr.clone()),
                    case_meta_line("Belegdatum:", state.date.clone()),
                    case_meta_line("Sachbearbeiter:", state.sender_legal.ceo.clone()),
                ],
            ),
        ],
    )
}

/// Label/value row inside the case summary panel. The label column is
/// fixed-width so values align.
fn panel_row(label: &str, value: String) -> StyledNode {
    let value_style = bold(8.25, SLATE_800);
    StyledNode::block(
        BlockStyle {
            gap: 12.0,
            align_items: AlignItems::Start,
            ..BlockStyle::row()
        },
        vec![
            StyledNode::block(
                BlockStyle {
                    width: Dimension::Pt(105.0),
                    flex_shrink: 0.0,
                    ..BlockStyle::column()
                },
                vec![StyledNode::text(bold(8.25, SLATE_500), label)],
            ),
            StyledNode::block(
                BlockStyle {
                    flex_grow: 1.0,
                    flex_basis: Dimension::Pt(0.0),
                    ..BlockStyle::column()
                },
                vec![StyledNode::text(value_style, value)],
            ),
        ],
    )
}

fn assurance_bullet(text: &str) -> StyledNode {
    StyledNode::block(
        BlockStyle {
            gap: 9.0,
            align_items: AlignItems::Start,
            ..BlockStyle::row()
        },
        vec![
            StyledNode::block(
                BlockStyle {
                    width: Dimension::Pt(4.5),
                    height: Dimension::Pt(4.5),
                    margin_top: 4.5,
                    flex_shrink: 0.0,
                    background: BRAND_GOLD,
                    corner_radius: 2.25,
                    ..BlockStyle::default()
                },
                vec![],
            ),
            StyledNode::block(
                BlockStyle {
                    flex_grow: 1.0,
                    flex_basis: Dimension::Pt(0.0),
                    ..BlockStyle::column()
                },
                vec![StyledNode::text(
                    BlockStyle {
                        italic: true,
                        line_height: 1.625,
                        ..txt(9.0, SLATE_700)
                    },
                    text,
                )],
            ),
        ],
    )
}

/// Main confirmation content: title, case panel, assurance text, signature.
fn confirmation_body(state: &DocumentState) -> StyledNode {
    let title = StyledNode::block(
        BlockStyle {
            border_bottom: HAIRLINE,
            border_color: SLATE_200,
            padding_bottom: 6.0,
            margin_bottom: 18.0,
            ..BlockStyle::column()
        },
        vec![StyledNode::text(
            bold(13.5, SLATE_800),
            "B2B-BESTÄTIGUNG: HERKUNFT & RECHTSMÄSSIGE VERWERTUNG",
        )],
    );

    let case_panel = StyledNode::block(
        BlockStyle {
            background: PANEL_BG,
            corner_radius: 1.5,
            padding_top: 15.0,
            padding_right: 15.0,
            padding_bottom: 15.0,
            padding_left: 15.0,
            margin_bottom: 24.0,
            gap: 6.0,
            ..BlockStyle::column()
        },
        vec![
            panel_row(
                "INSOLVENZVERFAHREN:",
                state.insolvency.proceeding_nr.clone(),
            ),
            panel_row("SCHULDNERIN:", state.insolvency.debtor_name.clone()),
            panel_row(
                "INSOLVENZGERICHT:",
                format!(
                    "{} (Eröffnung: {})",
                    state.insolvency.court, state.insolvency.opening_date
                ),
            ),
            panel_row("VERWERTUNGSSTELLE:", state.sender_name.clone()),
        ],
    );

    let assurances = StyledNode::block(
        BlockStyle {
            padding_top: 6.0,
            ..BlockStyle::column()
        },
        vec![
            StyledNode::text(
                BlockStyle {
                    margin_bottom: 9.0,
                    ..bold(9.0, SLATE_800)
                },
                "Zusicherung der Herkunft & Masseberechtigung",
            ),
            StyledNode::block(
                BlockStyle {
                    gap: 9.0,
                    padding_left: 3.0,
                    ..BlockStyle::column()
                },
                vec![
                    assurance_bullet(
                        "Die Ware stammt nachweislich aus dem verwertbaren Bestand der \
                         vorgenannten Schuldnerin.",
                    ),
                    assurance_bullet(
                        "Sämtliche Gegenstände sind zum Zeitpunkt der Verwertung frei von \
                         Rechten Dritter.",
                    ),
                    assurance_bullet(
                        "Der gewerbliche Weiterverkauf durch den Erwerber ist rechtlich \
                         uneingeschränkt zulässig.",
                    ),
                ],
            ),
        ],
    );

    let verification = StyledNode::block(
        BlockStyle {
            padding_top: 18.0,
            ..BlockStyle::row()
        },
        vec![
            StyledNode::text(
                txt(7.5, SLATE_400),
                "Überprüfungsmöglichkeit der Verfahrensdaten über: ",
            ),
            StyledNode::text(
                BlockStyle {
                    italic: true,
                    ..txt(7.5, SLATE_400)
                },
                "insolvenzbekanntmachungen.de",
            ),
        ],
    );

    let signature = StyledNode::block(
        BlockStyle {
            margin_top: 36.0,
            ..BlockStyle::column()
        },
        vec![
            StyledNode::text(
                BlockStyle {
                    margin_bottom: 24.0,
                    ..bold(9.0, SLATE_500)
                },
                "Mit freundlichen Grüßen",
            ),
            StyledNode::block(
                BlockStyle {
                    width: Dimension::Pt(192.0),
                    ..BlockStyle::column()
                },
                vec![
                    StyledNode::text(bold(9.75, SLATE_800), state.sender_legal.ceo.clone()),
                    StyledNode::text(
                        BlockStyle {
                            margin_top: 1.5,
                            ..bold(6.75, SLATE_400)
                        },
                        "INSOLVENZSACHBEARBEITER",
                    ),
                ],
            ),
        ],
    );

    StyledNode::block(
        BlockStyle {
            flex_grow: 1.0,
            margin_top: 12.0,
            ..BlockStyle::column()
        },
        vec![
            title,
            case_panel,
            StyledNode::block(
                BlockStyle {
                    gap: 18.0,
                    ..BlockStyle::column()
                },
                vec![
                    StyledNode::text(
                        BlockStyle {
                            line_height: 1.625,
                            ..txt(9.0, SLATE_700)
                        },
                        "Sehr geehrte Damen und Herren,",
                    ),
                    StyledNode::text(
                        BlockStyle {
                            line_height: 1.625,
                            ..txt(9.0, SLATE_700)
                        },
                        format!(
                            "hiermit bestätigen wir Ihnen die ordnungsgemäße und rechtlich \
                             zulässige Verwertung der von Ihnen erworbenen Gegenstände aus dem \
                             Insolvenzverfahren {} ({}).",
                            state.insolvency.debtor_name, state.insolvency.proceeding_nr
                        ),
                    ),
                    assurances,
                    verification,
                    signature,
                ],
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::paginate;

    fn collect_text(node: &StyledNode, out: &mut Vec<String>) {
        match node {
            StyledNode::Text { text, .. } => out.push(text.clone()),
            StyledNode::Block { children, .. } => {
                for child in children {
                    collect_text(child, out);
                }
            }
            StyledNode::Logo { .. } => {}
        }
    }

    fn all_text(node: &StyledNode) -> String {
        let mut out = Vec::new();
        collect_text(node, &mut out);
        out.join("\n")
    }

    #[test]
    fn invoice_first_page_has_meta_and_title() {
        let state = DocumentState::generated();
        let pages = paginate(&state.items, 8);
        let tree = invoice_page(&state, &pages[0]);
        let text = all_text(&tree);
        assert!(text.contains("RECHNUNG"));
        assert!(text.contains("Rechnungs-Nr.:"));
        assert!(text.contains(&state.invoice_nr));
        assert!(text.contains(&format!("KD-{}", state.client.customer_nr)));
        assert!(text.contains("Produkt & Beschreibung"));
        assert!(text.contains("Gesamtbetrag"));
        assert!(text.contains("§ 159 InsO"));
        assert!(text.contains("§ 80 Abs. 1 InsO"));
    }

    #[test]
    fn middle_page_skips_meta_and_totals() {
        let mut state = DocumentState::generated();
        let item = state.items[0].clone();
        state.items = (0..17)
            .map(|i| {
                let mut it = item.clone();
                it.id = format!("it-{i}");
                it
            })
            .collect();
        let pages = paginate(&state.items, 8);
        assert_eq!(pages.len(), 3);

        let middle = all_text(&invoice_page(&state, &pages[1]));
        assert!(!middle.contains("Rechnungs-Nr.:"));
        assert!(!middle.contains("Gesamtbetrag"));
        assert!(middle.contains("Produkt & Beschreibung"));
        // Footer appears on every page.
        assert!(middle.contains("Firmengericht"));
    }

    #[test]
    fn empty_items_page_still_shows_totals() {
        let mut state = DocumentState::generated();
        state.items.clear();
        let pages = paginate(&state.items, 8);
        assert_eq!(pages.len(), 1);
        let text = all_text(&invoice_page(&state, &pages[0]));
        assert!(!text.contains("Produkt & Beschreibung"));
        assert!(text.contains("Gesamtbetrag"));
        assert!(text.contains("0,00\u{a0}€"));
    }

    #[test]
    fn eu_region_renders_tax_free_delivery() {
        let mut state = DocumentState::generated();
        state.tax_region = crate::model::TaxRegion::Eu;
        let pages = paginate(&state.items, 8);
        let text = all_text(&invoice_page(&state, &pages[0]));
        assert!(text.contains("Innergemeinschaftliche Lieferung (steuerfrei)"));
        assert!(text.contains("Umsatzsteuer (0%)"));
    }

    #[test]
    fn confirmation_contains_case_facts() {
        let state = DocumentState::generated();
        let text = all_text(&confirmation_page(&state));
        assert!(text.contains("B2B-BESTÄTIGUNG: HERKUNFT & RECHTSMÄSSIGE VERWERTUNG"));
        assert!(!text.contains("RECHNUNG\n"), "confirmation hides the invoice title");
        assert!(text.contains(&state.insolvency.proceeding_nr));
        assert!(text.contains(&state.insolvency.debtor_name));
        assert!(text.contains("insolvenzbekanntmachungen.de"));
        assert!(text.contains("Mit freundlichen Grüßen"));
        assert!(text.contains("INSOLVENZSACHBEARBEITER"));
        assert!(text.contains(&format!("(Eröffnung: {})", state.insolvency.opening_date)));
    }

    #[test]
    fn quantity_formatting() {
        assert_eq!(format_quantity(7.0), "7");
        assert_eq!(format_quantity(2.5), "2.5");
        assert_eq!(format_quantity(0.0), "0");
    }

    #[test]
    fn tax_percent_label() {
        assert_eq!(format_tax_percent(0.19), "19%");
        assert_eq!(format_tax_percent(0.0), "0%");
        assert_eq!(format_tax_percent(0.07), "7%");
    }
}
