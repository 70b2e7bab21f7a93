//! Pagination – splits the ordered line-item sequence into fixed-capacity
//! pages and tags each page with its layout flags.
//!
//! Handles:
//! - empty documents (exactly one empty page so header/totals/footer still
//!   render)
//! - first/last flags driving the address block and the totals block
//! - 1-based page numbering

use crate::model::LineItem;

/// Default number of items per invoice page. This is a layout constant tied
/// to the physical page height, not a business rule, so it stays
/// configurable.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 8;

/// One logical invoice page: an ordered slice of the document's items plus
/// the flags the renderer keys off.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPage<'a> {
    pub items: &'a [LineItem],
    /// True only for the opening page (carries the address/metadata block).
    pub is_first: bool,
    /// True only for the closing page.
    pub is_last: bool,
    /// The totals block is attached to the closing page only.
    pub has_totals: bool,
    /// 1-based sequential index.
    pub page_number: usize,
}

/// Split `items` into consecutive chunks of at most `capacity`, preserving
/// order. Empty input produces exactly one empty page. A capacity of 0 is
/// treated as 1.
pub fn paginate(items: &[LineItem], capacity: usize) -> Vec<ItemPage<'_>> {
    let capacity = capacity.max(1);

    if items.is_empty() {
        return vec![ItemPage {
            items: &[],
            is_first: true,
            is_last: true,
            has_totals: true,
            page_number: 1,
        }];
    }

    let total = (items.len() + capacity - 1) / capacity;
    items
        .chunks(capacity)
        .enumerate()
        .map(|(idx, chunk)| {
            let is_last = idx + 1 == total;
            ItemPage {
                items: chunk,
                is_first: idx == 0,
                is_last,
                has_totals: is_last,
                page_number: idx + 1,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<LineItem> {
        (0..n)
            .map(|i| LineItem {
                id: format!("item-{i}"),
                name: format!("Los {i}"),
                article_nr: format!("A-{i}"),
                quantity: 1.0,
                unit_price: 1.0,
                description: None,
                notes: None,
            })
            .collect()
    }

    #[test]
    fn empty_items_single_page() {
        let pages = paginate(&[], DEFAULT_ITEMS_PER_PAGE);
        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert!(page.items.is_empty());
        assert!(page.is_first && page.is_last && page.has_totals);
        assert_eq!(page.page_number, 1);
    }

    #[test]
    fn seventeen_items_three_pages() {
        let all = items(17);
        let pages = paginate(&all, 8);
        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages.iter().map(|p| p.items.len()).collect::<Vec<_>>(),
            vec![8, 8, 1]
        );
        assert!(pages[0].is_first && !pages[1].is_first && !pages[2].is_first);
        assert!(!pages[0].has_totals && !pages[1].has_totals && pages[2].has_totals);
        assert_eq!(
            pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn page_count_and_order_preserved() {
        for n in 0..40 {
            let all = items(n);
            for capacity in 1..10 {
                let pages = paginate(&all, capacity);
                let expected = if n == 0 {
                    1
                } else {
                    (n + capacity - 1) / capacity
                };
                assert_eq!(pages.len(), expected, "n={n} capacity={capacity}");
                assert!(pages.iter().all(|p| p.items.len() <= capacity));

                // Concatenation equals the original in order.
                let joined: Vec<&str> = pages
                    .iter()
                    .flat_map(|p| p.items.iter().map(|i| i.id.as_str()))
                    .collect();
                let original: Vec<&str> = all.iter().map(|i| i.id.as_str()).collect();
                assert_eq!(joined, original);

                // Exactly one first, one last; totals iff last.
                assert_eq!(pages.iter().filter(|p| p.is_first).count(), 1);
                assert_eq!(pages.iter().filter(|p| p.is_last).count(), 1);
                assert!(pages.iter().all(|p| p.has_totals == p.is_last));
            }
        }
    }

    #[test]
    fn zero_capacity_treated_as_one() {
        let all = items(3);
        let pages = paginate(&all, 0);
        assert_eq!(pages.len(), 3);
    }

    #[test]
    fn single_page_is_first_and_last() {
        let all = items(5);
        let pages = paginate(&all, 8);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_first && pages[0].is_last && pages[0].has_totals);
    }
}
