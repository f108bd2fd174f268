use crate::{Card, Rarity};

/// Share of `selected` in `total`, in percent. An empty denominator yields 0.
pub fn percentage(selected: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    selected as f64 / total as f64 * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RarityTally {
    pub rarity: Rarity,
    pub selected: usize,
    pub total: usize,
}

impl RarityTally {
    pub fn percentage(&self) -> f64 {
        percentage(self.selected, self.total)
    }
}

/// Whole-collection progress. Always computed over the unfiltered list so the
/// numbers do not move when the user filters, sorts or pages.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    pub total_cards: usize,
    pub selected_cards: usize,
    pub total_price: f64,
    pub selected_price: f64,
    pub tiers: [RarityTally; 4],
}

impl CollectionStats {
    pub fn from_cards(cards: &[Card]) -> Self {
        let mut stats = Self {
            total_cards: cards.len(),
            selected_cards: 0,
            total_price: 0.0,
            selected_price: 0.0,
            tiers: Rarity::TIERS.map(|rarity| RarityTally {
                rarity,
                selected: 0,
                total: 0,
            }),
        };

        for card in cards {
            stats.total_price += card.price;
            if card.checked {
                stats.selected_cards += 1;
                stats.selected_price += card.price;
            }
            if let Some(tally) = stats.tiers.iter_mut().find(|tally| tally.rarity == card.rarity) {
                tally.total += 1;
                if card.checked {
                    tally.selected += 1;
                }
            }
        }

        stats
    }

    pub fn unselected_price(&self) -> f64 {
        self.total_price - self.selected_price
    }

    pub fn completion(&self) -> f64 {
        percentage(self.selected_cards, self.total_cards)
    }

    pub fn tier(&self, rarity: Rarity) -> Option<&RarityTally> {
        self.tiers.iter().find(|tally| tally.rarity == rarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_card_collection() -> Vec<Card> {
        vec![
            Card::new("Aerith", Rarity::Common, 1, 0.10).with_checked(true),
            Card::new("Barret", Rarity::Common, 2, 0.20),
            Card::new("Cid", Rarity::Rare, 3, 1.50),
            Card::new("Sephiroth", Rarity::Mythic, 4, 25.00).with_checked(true),
        ]
    }

    #[test]
    fn rarity_tallies_match_the_four_card_scenario() {
        let stats = CollectionStats::from_cards(&four_card_collection());

        let common = stats.tier(Rarity::Common).expect("common");
        assert_eq!((common.selected, common.total), (1, 2));
        let uncommon = stats.tier(Rarity::Uncommon).expect("uncommon");
        assert_eq!((uncommon.selected, uncommon.total), (0, 0));
        let rare = stats.tier(Rarity::Rare).expect("rare");
        assert_eq!((rare.selected, rare.total), (0, 1));
        let mythic = stats.tier(Rarity::Mythic).expect("mythic");
        assert_eq!((mythic.selected, mythic.total), (1, 1));
        assert_eq!((stats.selected_cards, stats.total_cards), (2, 4));
        assert_eq!(stats.completion(), 50.0);
    }

    #[test]
    fn prices_split_between_owned_and_missing() {
        let stats = CollectionStats::from_cards(&four_card_collection());
        assert!((stats.total_price - 26.80).abs() < 1e-9);
        assert!((stats.selected_price - 25.10).abs() < 1e-9);
        assert!((stats.unselected_price() - 1.70).abs() < 1e-9);
    }

    #[test]
    fn percentage_of_empty_total_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(CollectionStats::from_cards(&[]).completion(), 0.0);
        assert_eq!(
            RarityTally {
                rarity: Rarity::Rare,
                selected: 0,
                total: 0
            }
            .percentage(),
            0.0
        );
    }

    #[test]
    fn special_cards_count_overall_but_not_in_tiers() {
        let cards = vec![Card::new("Chocobo Token", Rarity::Special, 9, 0.0).with_checked(true)];
        let stats = CollectionStats::from_cards(&cards);
        assert_eq!(stats.selected_cards, 1);
        assert!(stats.tiers.iter().all(|tally| tally.total == 0));
    }
}
