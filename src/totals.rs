//! Financial calculator – pure totals over line items plus fixed-locale
//! currency formatting. No environment locale is consulted anywhere.

use crate::model::{LineItem, TaxRegion};

/// Computed money amounts for one document, in EUR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// The rate actually applied: intra-community exports are tax-free
/// regardless of the stored rate.
pub fn effective_tax_rate(tax_region: TaxRegion, tax_rate: f64) -> f64 {
    match tax_region {
        TaxRegion::Eu => 0.0,
        TaxRegion::De => tax_rate,
    }
}

/// Compute subtotal, tax, and grand total. Empty items yield all zeros.
pub fn compute_totals(items: &[LineItem], tax_region: TaxRegion, tax_rate: f64) -> Totals {
    let subtotal: f64 = items.iter().map(|i| i.quantity * i.unit_price).sum();
    let tax = subtotal * effective_tax_rate(tax_region, tax_rate);
    Totals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

/// Format an EUR amount the fixed de-DE way: `.` thousands grouping, `,`
/// decimal separator, two decimals, trailing `€` after a no-break space.
///
/// `26481.0` → `"26.481,00 €"`.
pub fn format_eur(amount: f64) -> String {
    let negative = amount < 0.0;
    // Round to cents first so 0.005 doesn't truncate away.
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped},{frac:02}\u{a0}€")
}
