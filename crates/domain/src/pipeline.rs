//! Filter -> sort -> paginate -> aggregate over one collection snapshot.
//!
//! Every stage is a pure function of the card list and the view state, so the
//! shell simply re-derives the whole view after each interaction.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::{Card, CollectionStats, SortKey, ViewState};

#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<'a> {
    pub cards: Vec<&'a Card>,
    /// 1-indexed, already clamped to `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView<'a> {
    pub matching: Vec<&'a Card>,
    pub page: PageSlice<'a>,
    pub stats: CollectionStats,
}

pub fn derive_view<'a>(cards: &'a [Card], view: &ViewState) -> DerivedView<'a> {
    let mut matching = filter_cards(cards, view);
    sort_cards(&mut matching, view.sort_key);
    let page = paginate(&matching, view.page, view.page_size);

    DerivedView {
        page,
        matching,
        stats: CollectionStats::from_cards(cards),
    }
}

pub fn filter_cards<'a>(cards: &'a [Card], view: &ViewState) -> Vec<&'a Card> {
    cards.iter().filter(|card| view.matches(card)).collect()
}

/// Stable: cards with equal keys keep their relative order.
pub fn sort_cards(cards: &mut [&Card], key: SortKey) {
    cards.sort_by(|a, b| compare_cards(a, b, key));
}

pub fn compare_cards(a: &Card, b: &Card, key: SortKey) -> Ordering {
    match key {
        SortKey::NameAsc => compare_names(&a.name, &b.name),
        SortKey::NameDesc => compare_names(&b.name, &a.name),
        SortKey::PriceAsc => a.price.total_cmp(&b.price),
        SortKey::PriceDesc => b.price.total_cmp(&a.price),
        SortKey::NumberAsc => a.collector_number.cmp(&b.collector_number),
        SortKey::NumberDesc => b.collector_number.cmp(&a.collector_number),
    }
}

/// Accents and case are ignored first ("Éclair" sits among the E's), then
/// accented forms follow plain ones, then case decides.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    name_key(a, true)
        .cmp(name_key(b, true))
        .then_with(|| name_key(a, false).cmp(name_key(b, false)))
        .then_with(|| a.cmp(b))
}

fn name_key(name: &str, strip_marks: bool) -> impl Iterator<Item = char> + '_ {
    name.nfd()
        .filter(move |ch| !(strip_marks && is_combining_mark(*ch)))
        .flat_map(char::to_lowercase)
}

/// `None` disables pagination: everything lands on a single page.
pub fn total_pages(count: usize, page_size: Option<usize>) -> usize {
    match page_size {
        Some(size) => count.div_ceil(size.max(1)).max(1),
        None => 1,
    }
}

pub fn paginate<'a>(cards: &[&'a Card], page: usize, page_size: Option<usize>) -> PageSlice<'a> {
    let total_pages = total_pages(cards.len(), page_size);
    let page = page.clamp(1, total_pages);
    let Some(size) = page_size.map(|size| size.max(1)) else {
        return PageSlice {
            cards: cards.to_vec(),
            page,
            total_pages,
            offset: 0,
        };
    };

    let offset = (page - 1) * size;
    let end = (offset + size).min(cards.len());
    PageSlice {
        cards: cards.get(offset..end).unwrap_or_default().to_vec(),
        page,
        total_pages,
        offset,
    }
}
