use std::collections::{HashMap, HashSet};
use std::time::Duration;

use card_binder_adapters::{present_collector_number, present_price};
use card_binder_application::{
    ApplicationService, LoadCollectionCommand, PendingLoad, PollSyncCommand,
    PollThumbnailCommand, RequestThumbnailCommand, SyncMetricsQuery, SyncOutcome, ThumbnailEvent,
    ToggleSelectionCommand,
};
use card_binder_domain::{
    derive_view, BoosterFilter, Card, CheckedFilter, CollectionStats, DerivedView, Rarity,
    RarityFilter, SelectionChange, SortKey, ViewState,
};
use eframe::egui::{self, Color32, RichText};
use tracing::{debug, warn};

use crate::config::{AppConfig, FailurePolicy};

const WINDOW_WIDTH: f32 = 1180.0;
const WINDOW_HEIGHT: f32 = 820.0;
const CARD_WIDTH: f32 = 170.0;
const ART_HEIGHT: f32 = 236.0;
const POLL_INTERVAL: Duration = Duration::from_millis(120);
const PAGE_SIZE_CHOICES: [usize; 4] = [10, 20, 50, 100];

pub fn tier_color(rarity: Rarity) -> Color32 {
    match rarity {
        Rarity::Common => Color32::from_rgb(0xa0, 0xa0, 0xa0),
        Rarity::Uncommon => Color32::from_rgb(0x4c, 0xaf, 0x50),
        Rarity::Rare => Color32::from_rgb(0x21, 0x96, 0xf3),
        Rarity::Mythic => Color32::from_rgb(0xff, 0x98, 0x00),
        Rarity::Special => Color32::from_rgb(0x9c, 0x27, 0xb0),
    }
}

fn page_size_label(page_size: Option<usize>) -> String {
    match page_size {
        Some(size) => format!("{size} per page"),
        None => "Everything".to_string(),
    }
}

fn page_size_choices(configured: usize) -> Vec<Option<usize>> {
    let mut sizes: Vec<usize> = PAGE_SIZE_CHOICES.to_vec();
    if !sizes.contains(&configured) {
        sizes.push(configured);
        sizes.sort_unstable();
    }
    sizes.into_iter().map(Some).chain([None]).collect()
}

fn summary_line(stats: &CollectionStats) -> String {
    format!(
        "{} / {} cards owned | owned {} of {}",
        stats.selected_cards,
        stats.total_cards,
        present_price(stats.selected_price),
        present_price(stats.total_price)
    )
}

fn bar_fill(percent: f64) -> f32 {
    (percent / 100.0) as f32
}

enum LoadState {
    Loading(PendingLoad),
    Loaded,
    Failed(String),
}

/// Everything the user can do in one frame. Collected while drawing and
/// applied afterwards, once the derived view no longer borrows the cards.
#[derive(Debug, Clone, PartialEq)]
enum UiAction {
    Toggle { name: String, checked: bool },
    SetRarity(RarityFilter),
    SetChecked(CheckedFilter),
    SetBooster(BoosterFilter),
    SetSort(SortKey),
    SetPageSize(Option<usize>),
    GoToPage(usize),
    ToggleProgress,
    RequestThumbnail(String),
    Retry,
    DismissAlert,
}

pub struct CardBinderApp<'a> {
    service: &'a ApplicationService,
    title: String,
    failure_policy: FailurePolicy,
    page_sizes: Vec<Option<usize>>,
    cards: Vec<Card>,
    view: ViewState,
    load: LoadState,
    textures: HashMap<String, egui::TextureHandle>,
    requested_art: HashSet<String>,
    failed_art: HashSet<String>,
    alerts: Vec<String>,
    sync_received: u64,
}

impl<'a> CardBinderApp<'a> {
    fn new(service: &'a ApplicationService, config: &AppConfig) -> Self {
        Self {
            service,
            title: config.title.clone(),
            failure_policy: config.failure_policy,
            page_sizes: page_size_choices(config.page_size),
            cards: Vec::new(),
            view: ViewState::with_page_size(Some(config.page_size)),
            load: LoadState::Loading(service.start_load(LoadCollectionCommand)),
            textures: HashMap::new(),
            requested_art: HashSet::new(),
            failed_art: HashSet::new(),
            alerts: Vec::new(),
            sync_received: 0,
        }
    }

    fn poll_load(&mut self) {
        if let LoadState::Loading(pending) = &self.load {
            if let Some(result) = pending.try_take() {
                self.load = match result {
                    Ok(cards) => {
                        self.cards = cards;
                        LoadState::Loaded
                    }
                    Err(error) => LoadState::Failed(error.to_string()),
                };
            }
        }
    }

    fn poll_sync(&mut self) {
        loop {
            match self.service.poll_sync(PollSyncCommand) {
                Ok(Some(outcome)) => {
                    self.sync_received += 1;
                    self.handle_sync_outcome(outcome);
                }
                Ok(None) => break,
                Err(error) => {
                    warn!(%error, "selection sync unavailable");
                    break;
                }
            }
        }
    }

    /// Local state is never rolled back; a failure only produces an alert.
    fn handle_sync_outcome(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Saved { sequence, change } => {
                debug!(card = %change.name, sequence, "selection saved");
            }
            SyncOutcome::Failed { change, reason, .. } => {
                if self.failure_policy == FailurePolicy::Alert {
                    self.alerts.push(format!(
                        "Could not save \"{}\" as {}: {reason}",
                        change.name,
                        if change.checked { "owned" } else { "missing" }
                    ));
                }
            }
        }
    }

    fn poll_thumbnails(&mut self, ctx: &egui::Context) {
        loop {
            match self.service.poll_thumbnail(PollThumbnailCommand) {
                Ok(Some(ThumbnailEvent::Ready(thumbnail))) => {
                    let image = egui::ColorImage::from_rgba_unmultiplied(
                        [thumbnail.width as usize, thumbnail.height as usize],
                        &thumbnail.rgba,
                    );
                    let texture = ctx.load_texture(
                        thumbnail.url.clone(),
                        image,
                        egui::TextureOptions::LINEAR,
                    );
                    self.textures.insert(thumbnail.url, texture);
                }
                Ok(Some(ThumbnailEvent::Failed { url, .. })) => {
                    self.failed_art.insert(url);
                }
                Ok(None) => break,
                Err(error) => {
                    warn!(%error, "thumbnail loader unavailable");
                    break;
                }
            }
        }
    }

    fn has_background_work(&self) -> bool {
        if matches!(self.load, LoadState::Loading(_)) {
            return true;
        }
        if self.requested_art.len() > self.textures.len() + self.failed_art.len() {
            return true;
        }
        // Counters move before the outcome is queued, so only outcomes
        // already polled count as done.
        match self.service.sync_metrics(SyncMetricsQuery) {
            Ok(metrics) => metrics.submitted > metrics.coalesced + self.sync_received,
            Err(_) => false,
        }
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::Toggle { name, checked } => {
                match self
                    .service
                    .toggle_selection(&self.cards, ToggleSelectionCommand { name, checked })
                {
                    Ok(next) => self.cards = next,
                    Err(error) => warn!(%error, "toggle ignored"),
                }
            }
            UiAction::SetRarity(filter) => self.view.set_rarity_filter(filter),
            UiAction::SetChecked(filter) => self.view.set_checked_filter(filter),
            UiAction::SetBooster(filter) => self.view.set_booster_filter(filter),
            UiAction::SetSort(key) => self.view.set_sort_key(key),
            UiAction::SetPageSize(size) => self.view.set_page_size(size),
            UiAction::GoToPage(page) => self.view.go_to_page(page),
            UiAction::ToggleProgress => self.view.toggle_progress(),
            UiAction::RequestThumbnail(url) => {
                if self.requested_art.insert(url.clone()) {
                    if let Err(error) = self
                        .service
                        .request_thumbnail(RequestThumbnailCommand { url: url.clone() })
                    {
                        warn!(%url, %error, "thumbnail not requested");
                        self.failed_art.insert(url);
                    }
                }
            }
            UiAction::Retry => {
                self.load = LoadState::Loading(self.service.start_load(LoadCollectionCommand));
            }
            UiAction::DismissAlert => {
                if !self.alerts.is_empty() {
                    self.alerts.remove(0);
                }
            }
        }
    }

    fn draw_collection(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let derived = derive_view(&self.cards, &self.view);

        ui.label(RichText::new(summary_line(&derived.stats)).strong());
        self.draw_progress(ui, &derived.stats, actions);
        ui.separator();
        self.draw_controls(ui, &derived, actions);
        ui.separator();

        if self.cards.is_empty() {
            ui.label("No cards in this collection.");
            return;
        }
        if derived.matching.is_empty() {
            ui.label("No cards match these filters.");
            return;
        }

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for card in &derived.page.cards {
                        ui.group(|ui| {
                            ui.set_width(CARD_WIDTH);
                            ui.vertical(|ui| self.draw_card(ui, card, actions));
                        });
                    }
                });
            });
    }

    fn draw_progress(
        &self,
        ui: &mut egui::Ui,
        stats: &CollectionStats,
        actions: &mut Vec<UiAction>,
    ) {
        let panel = egui::CollapsingHeader::new("Collection progress")
            .open(Some(self.view.progress_open))
            .show(ui, |ui| {
                ui.add(
                    egui::ProgressBar::new(bar_fill(stats.completion()))
                        .text(format!(
                            "All cards {} / {} ({:.1}%)",
                            stats.selected_cards,
                            stats.total_cards,
                            stats.completion()
                        )),
                );
                for tally in &stats.tiers {
                    ui.add(
                        egui::ProgressBar::new(bar_fill(tally.percentage()))
                            .fill(tier_color(tally.rarity))
                            .text(format!(
                                "{} {} / {}",
                                tally.rarity.label(),
                                tally.selected,
                                tally.total
                            )),
                    );
                }
                ui.label(format!(
                    "Still missing: {}",
                    present_price(stats.unselected_price())
                ));
            });
        if panel.header_response.clicked() {
            actions.push(UiAction::ToggleProgress);
        }
    }

    fn draw_controls(
        &self,
        ui: &mut egui::Ui,
        derived: &DerivedView<'_>,
        actions: &mut Vec<UiAction>,
    ) {
        ui.horizontal_wrapped(|ui| {
            let mut rarity = self.view.rarity_filter;
            egui::ComboBox::from_label("Rarity")
                .selected_text(rarity.label())
                .show_ui(ui, |ui| {
                    for option in RarityFilter::OPTIONS {
                        ui.selectable_value(&mut rarity, option, option.label());
                    }
                });
            if rarity != self.view.rarity_filter {
                actions.push(UiAction::SetRarity(rarity));
            }

            let mut checked = self.view.checked_filter;
            egui::ComboBox::from_label("Owned")
                .selected_text(checked.label())
                .show_ui(ui, |ui| {
                    for option in CheckedFilter::OPTIONS {
                        ui.selectable_value(&mut checked, option, option.label());
                    }
                });
            if checked != self.view.checked_filter {
                actions.push(UiAction::SetChecked(checked));
            }

            let mut booster = self.view.booster_filter;
            egui::ComboBox::from_label("Booster")
                .selected_text(booster.label())
                .show_ui(ui, |ui| {
                    for option in BoosterFilter::OPTIONS {
                        ui.selectable_value(&mut booster, option, option.label());
                    }
                });
            if booster != self.view.booster_filter {
                actions.push(UiAction::SetBooster(booster));
            }

            let mut sort = self.view.sort_key;
            egui::ComboBox::from_label("Sort")
                .selected_text(sort.label())
                .show_ui(ui, |ui| {
                    for option in SortKey::OPTIONS {
                        ui.selectable_value(&mut sort, option, option.label());
                    }
                });
            if sort != self.view.sort_key {
                actions.push(UiAction::SetSort(sort));
            }
        });

        let page = &derived.page;
        ui.horizontal(|ui| {
            if ui
                .add_enabled(page.page > 1, egui::Button::new("< Previous"))
                .clicked()
            {
                actions.push(UiAction::GoToPage(page.page - 1));
            }
            ui.label(format!(
                "Page {} / {} ({} matching)",
                page.page,
                page.total_pages,
                derived.matching.len()
            ));
            if ui
                .add_enabled(page.page < page.total_pages, egui::Button::new("Next >"))
                .clicked()
            {
                actions.push(UiAction::GoToPage(page.page + 1));
            }

            let mut page_size = self.view.page_size;
            egui::ComboBox::from_id_salt("page-size")
                .selected_text(page_size_label(page_size))
                .show_ui(ui, |ui| {
                    for option in &self.page_sizes {
                        ui.selectable_value(&mut page_size, *option, page_size_label(*option));
                    }
                });
            if page_size != self.view.page_size {
                actions.push(UiAction::SetPageSize(page_size));
            }
        });
    }

    fn draw_card(&self, ui: &mut egui::Ui, card: &Card, actions: &mut Vec<UiAction>) {
        let texture = card
            .image_url
            .as_deref()
            .and_then(|url| self.textures.get(url));

        let art_clicked = match texture {
            Some(texture) => ui
                .add(
                    egui::Image::new(texture)
                        .max_width(CARD_WIDTH)
                        .sense(egui::Sense::click()),
                )
                .clicked(),
            None => {
                if let Some(url) = &card.image_url {
                    if !self.requested_art.contains(url) {
                        actions.push(UiAction::RequestThumbnail(url.clone()));
                    }
                }
                let (rect, response) = ui.allocate_exact_size(
                    egui::vec2(CARD_WIDTH, ART_HEIGHT),
                    egui::Sense::click(),
                );
                ui.painter().rect_filled(rect, 6.0, Color32::from_gray(48));
                let caption = match &card.image_url {
                    Some(url) if self.failed_art.contains(url) => "no image",
                    Some(_) => "loading...",
                    None => "no image",
                };
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    caption,
                    egui::FontId::proportional(14.0),
                    Color32::from_gray(160),
                );
                response.clicked()
            }
        };
        if art_clicked {
            let change = SelectionChange::toggle(card);
            actions.push(UiAction::Toggle {
                name: change.name,
                checked: change.checked,
            });
        }

        ui.label(RichText::new(&card.name).strong());
        ui.horizontal(|ui| {
            ui.label(present_collector_number(card.collector_number));
            ui.colored_label(tier_color(card.rarity), card.rarity.label());
        });
        ui.horizontal(|ui| {
            ui.label(present_price(card.price));
            if card.booster {
                ui.colored_label(Color32::from_rgb(0xff, 0xc1, 0x07), "Booster");
            }
        });

        let mut owned = card.checked;
        if ui.checkbox(&mut owned, "Owned").changed() {
            actions.push(UiAction::Toggle {
                name: card.name.clone(),
                checked: owned,
            });
        }
    }

    fn draw_alert(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let Some(message) = self.alerts.first() else {
            return;
        };
        egui::Window::new("Selection not saved")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.label("Your change is kept locally.");
                if ui.button("OK").clicked() {
                    actions.push(UiAction::DismissAlert);
                }
            });
    }
}

impl eframe::App for CardBinderApp<'_> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_load();
        self.poll_sync();
        self.poll_thumbnails(ctx);

        let mut actions = Vec::new();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(&self.title);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let alert_open = !self.alerts.is_empty();
            ui.add_enabled_ui(!alert_open, |ui| match &self.load {
                LoadState::Loading(_) => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading collection...");
                    });
                }
                LoadState::Failed(reason) => {
                    ui.colored_label(
                        Color32::from_rgb(0xe5, 0x39, 0x35),
                        format!("Could not load the collection: {reason}"),
                    );
                    if ui.button("Retry").clicked() {
                        actions.push(UiAction::Retry);
                    }
                }
                LoadState::Loaded => self.draw_collection(ui, &mut actions),
            });
        });

        self.draw_alert(ctx, &mut actions);

        for action in actions {
            self.apply(action);
        }

        if self.has_background_work() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}

pub fn launch_window(service: &ApplicationService, config: &AppConfig) -> Result<(), String> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_title(config.title.clone()),
        ..Default::default()
    };

    eframe::run_native(
        "card-binder",
        options,
        Box::new(|_cc| Ok(Box::new(CardBinderApp::new(service, config)))),
    )
    .map_err(|error| format!("failed to start UI: {error}"))
}
