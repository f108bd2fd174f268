use serde::{Deserialize, Serialize};

use crate::Card;

/// Body of `POST /api/update-selection`: "set `checked` of card `name` to
/// this value". Naturally idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionChange {
    pub name: String,
    pub checked: bool,
}

impl SelectionChange {
    pub fn new(name: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            checked,
        }
    }

    /// The change that flips the current flag of `card`.
    pub fn toggle(card: &Card) -> Self {
        Self::new(card.name.clone(), !card.checked)
    }
}

/// Derives the next snapshot with the change applied; the input is left
/// untouched. Returns `None` when no card carries that name.
pub fn apply_selection(cards: &[Card], change: &SelectionChange) -> Option<Vec<Card>> {
    if !cards.iter().any(|card| card.name == change.name) {
        return None;
    }

    Some(
        cards
            .iter()
            .map(|card| {
                if card.name == change.name {
                    Card {
                        checked: change.checked,
                        ..card.clone()
                    }
                } else {
                    card.clone()
                }
            })
            .collect(),
    )
}
