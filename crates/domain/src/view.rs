use std::str::FromStr;

use crate::{Card, DomainError, Rarity};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RarityFilter {
    #[default]
    All,
    Only(Rarity),
}

impl RarityFilter {
    pub const OPTIONS: [RarityFilter; 5] = [
        Self::All,
        Self::Only(Rarity::Common),
        Self::Only(Rarity::Uncommon),
        Self::Only(Rarity::Rare),
        Self::Only(Rarity::Mythic),
    ];

    pub fn matches(self, card: &Card) -> bool {
        match self {
            Self::All => true,
            Self::Only(rarity) => card.rarity == rarity,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(rarity) => rarity.as_str(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All rarities",
            Self::Only(rarity) => rarity.label(),
        }
    }
}

impl FromStr for RarityFilter {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        value.parse::<Rarity>().map(Self::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckedFilter {
    #[default]
    All,
    Checked,
    Unchecked,
}

impl CheckedFilter {
    pub const OPTIONS: [CheckedFilter; 3] = [Self::All, Self::Checked, Self::Unchecked];

    pub fn matches(self, card: &Card) -> bool {
        match self {
            Self::All => true,
            Self::Checked => card.checked,
            Self::Unchecked => !card.checked,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Checked => "checked",
            Self::Unchecked => "unchecked",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All cards",
            Self::Checked => "Owned",
            Self::Unchecked => "Missing",
        }
    }
}

impl FromStr for CheckedFilter {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::OPTIONS
            .into_iter()
            .find(|option| option.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| DomainError::UnknownOption {
                kind: "selection filter",
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoosterFilter {
    #[default]
    All,
    Booster,
    NonBooster,
}

impl BoosterFilter {
    pub const OPTIONS: [BoosterFilter; 3] = [Self::All, Self::Booster, Self::NonBooster];

    pub fn matches(self, card: &Card) -> bool {
        match self {
            Self::All => true,
            Self::Booster => card.booster,
            Self::NonBooster => !card.booster,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Booster => "booster",
            Self::NonBooster => "non-booster",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "Any source",
            Self::Booster => "In boosters",
            Self::NonBooster => "Not in boosters",
        }
    }
}

impl FromStr for BoosterFilter {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::OPTIONS
            .into_iter()
            .find(|option| option.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| DomainError::UnknownOption {
                kind: "booster filter",
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    NumberAsc,
    NumberDesc,
}

impl SortKey {
    pub const OPTIONS: [SortKey; 6] = [
        Self::NameAsc,
        Self::NameDesc,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::NumberAsc,
        Self::NumberDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::NumberAsc => "number-asc",
            Self::NumberDesc => "number-desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NameAsc => "Name (A-Z)",
            Self::NameDesc => "Name (Z-A)",
            Self::PriceAsc => "Price (low first)",
            Self::PriceDesc => "Price (high first)",
            Self::NumberAsc => "Number (low first)",
            Self::NumberDesc => "Number (high first)",
        }
    }
}

impl FromStr for SortKey {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::OPTIONS
            .into_iter()
            .find(|option| option.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| DomainError::UnknownOption {
                kind: "sort",
                value: value.to_string(),
            })
    }
}

/// Everything the shell lets the user tweak. Any combination is valid.
///
/// Setters that change which cards match (filters, page size) send the user
/// back to page 1; sorting keeps the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub rarity_filter: RarityFilter,
    pub checked_filter: CheckedFilter,
    pub booster_filter: BoosterFilter,
    pub sort_key: SortKey,
    pub page: usize,
    pub page_size: Option<usize>,
    pub progress_open: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            rarity_filter: RarityFilter::All,
            checked_filter: CheckedFilter::All,
            booster_filter: BoosterFilter::All,
            sort_key: SortKey::NameAsc,
            page: 1,
            page_size: Some(DEFAULT_PAGE_SIZE),
            progress_open: false,
        }
    }
}

impl ViewState {
    pub fn with_page_size(page_size: Option<usize>) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn set_rarity_filter(&mut self, filter: RarityFilter) {
        if self.rarity_filter != filter {
            self.rarity_filter = filter;
            self.page = 1;
        }
    }

    pub fn set_checked_filter(&mut self, filter: CheckedFilter) {
        if self.checked_filter != filter {
            self.checked_filter = filter;
            self.page = 1;
        }
    }

    pub fn set_booster_filter(&mut self, filter: BoosterFilter) {
        if self.booster_filter != filter {
            self.booster_filter = filter;
            self.page = 1;
        }
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) {
        self.sort_key = sort_key;
    }

    pub fn set_page_size(&mut self, page_size: Option<usize>) {
        if self.page_size != page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn toggle_progress(&mut self) {
        self.progress_open = !self.progress_open;
    }

    pub fn matches(&self, card: &Card) -> bool {
        self.rarity_filter.matches(card)
            && self.checked_filter.matches(card)
            && self.booster_filter.matches(card)
    }
}
