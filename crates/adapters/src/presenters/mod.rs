use card_binder_domain::{Card, CollectionStats, PageSlice, UNNUMBERED};

pub fn present_card_row(card: &Card) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}{}",
        if card.checked { "[x]" } else { "[ ]" },
        present_collector_number(card.collector_number),
        card.rarity,
        present_price(card.price),
        card.name,
        if card.booster { "\t(booster)" } else { "" }
    )
}

pub fn present_page_footer(page: &PageSlice<'_>, matching: usize) -> String {
    format!(
        "page {}/{} | {} matching card{}",
        page.page,
        page.total_pages,
        matching,
        if matching == 1 { "" } else { "s" }
    )
}

pub fn present_stats(stats: &CollectionStats) -> Vec<String> {
    let mut lines = vec![
        format!(
            "cards: {} / {} ({:.1}%)",
            stats.selected_cards,
            stats.total_cards,
            stats.completion()
        ),
        format!("owned value: {}", present_price(stats.selected_price)),
        format!("missing value: {}", present_price(stats.unselected_price())),
        format!("total value: {}", present_price(stats.total_price)),
    ];
    lines.extend(stats.tiers.iter().map(|tally| {
        format!(
            "{:<9} {} / {} ({:.1}%)",
            tally.rarity.as_str(),
            tally.selected,
            tally.total,
            tally.percentage()
        )
    }));
    lines
}

pub fn present_price(price: f64) -> String {
    format!("{price:.2} €")
}

pub fn present_collector_number(number: u32) -> String {
    if number == UNNUMBERED {
        return "#-".to_string();
    }
    format!("#{number}")
}

#[cfg(test)]
mod tests {
    use card_binder_domain::{derive_view, Rarity, ViewState};

    use super::*;

    #[test]
    fn card_row_shows_flag_number_and_price() {
        let card = Card::new("Cloud", Rarity::Mythic, 7, 12.5)
            .with_checked(true)
            .with_booster(true);
        assert_eq!(
            present_card_row(&card),
            "[x]\t#7\tmythic\t12.50 €\tCloud\t(booster)"
        );
    }

    #[test]
    fn unnumbered_cards_show_a_dash() {
        assert_eq!(present_collector_number(UNNUMBERED), "#-");
    }

    #[test]
    fn footer_and_stats_lines() {
        let cards = vec![
            Card::new("Cloud", Rarity::Mythic, 7, 12.5).with_checked(true),
            Card::new("Moogle", Rarity::Common, 8, 0.5),
        ];
        let derived = derive_view(&cards, &ViewState::default());
        assert_eq!(
            present_page_footer(&derived.page, derived.matching.len()),
            "page 1/1 | 2 matching cards"
        );

        let lines = present_stats(&derived.stats);
        assert_eq!(lines[0], "cards: 1 / 2 (50.0%)");
        assert_eq!(lines[1], "owned value: 12.50 €");
        assert_eq!(lines[2], "missing value: 0.50 €");
        assert_eq!(lines.len(), 8);
    }
}
