mod card;
mod error;
mod pipeline;
mod selection;
mod stats;
mod view;

pub use card::{parse_collector_number, Card, Rarity, UNNUMBERED};
pub use error::DomainError;
pub use pipeline::{
    compare_cards, compare_names, derive_view, filter_cards, paginate, sort_cards, total_pages,
    DerivedView, PageSlice,
};
pub use selection::{apply_selection, SelectionChange};
pub use stats::{percentage, CollectionStats, RarityTally};
pub use view::{
    BoosterFilter, CheckedFilter, RarityFilter, SortKey, ViewState, DEFAULT_PAGE_SIZE,
};
