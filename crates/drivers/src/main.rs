mod config;
mod logging;
mod ui;

use std::process::ExitCode;
use std::sync::Arc;

use card_binder_adapters::{
    present_card_row, present_page_footer, present_stats, BackgroundSelectionSync,
    BackgroundThumbnailLoader, FsThumbnailCache, HttpBackend, HttpImageFetcher,
};
use card_binder_application::{
    ApplicationError, ApplicationService, LoadCollectionCommand, SaveSelectionCommand,
};
use card_binder_domain::{
    derive_view, BoosterFilter, CheckedFilter, CollectionStats, RarityFilter, SortKey, ViewState,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "card-binder", version, about = "Track which cards of a set you own")]
struct Cli {
    /// Backend base url, overrides CARD_BINDER_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
enum Command {
    /// Open the collection window (default).
    Ui,
    /// Print one page of the filtered, sorted collection.
    List(ListArgs),
    /// Print overall and per-rarity progress.
    Stats,
    /// Save the owned flag of one card.
    Set {
        name: String,
        #[arg(action = ArgAction::Set)]
        checked: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Args)]
struct ListArgs {
    #[arg(long, default_value = "all")]
    rarity: RarityFilter,
    #[arg(long, default_value = "all")]
    checked: CheckedFilter,
    #[arg(long, default_value = "all")]
    booster: BoosterFilter,
    #[arg(long, default_value = "name-asc")]
    sort: SortKey,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long)]
    page_size: Option<usize>,
    /// Print every matching card on one page.
    #[arg(long, conflicts_with_all = ["page", "page_size"])]
    all: bool,
}

#[derive(Debug, Clone)]
enum CommandError {
    Usage(String),
    Runtime(String),
}

fn main() -> ExitCode {
    logging::init_logging();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_base_url = api_url;
    }

    let service = match build_application_service(&config) {
        Ok(service) => service,
        Err(error) => {
            eprintln!("failed to start card-binder: {error}");
            return ExitCode::from(1);
        }
    };

    match run_command(cli.command.unwrap_or(Command::Ui), &service, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::Usage(msg)) => {
            eprintln!("{msg}");
            eprintln!("run `card-binder --help` for usage");
            ExitCode::from(2)
        }
        Err(CommandError::Runtime(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(1)
        }
    }
}

fn build_application_service(config: &AppConfig) -> Result<ApplicationService, ApplicationError> {
    let backend = Arc::new(HttpBackend::new(
        &config.api_base_url,
        config.request_timeout(),
    )?);
    let fetcher = Arc::new(HttpImageFetcher::new(config.request_timeout())?);

    Ok(ApplicationService::new(
        backend.clone(),
        backend.clone(),
        Box::new(BackgroundSelectionSync::new(backend)),
        Box::new(BackgroundThumbnailLoader::new(FsThumbnailCache::new(
            &config.cache_dir,
            fetcher,
        ))),
    ))
}

fn list_view(args: &ListArgs, config: &AppConfig) -> Result<ViewState, CommandError> {
    if args.page == 0 {
        return Err(CommandError::Usage("--page starts at 1".to_string()));
    }
    let page_size = if args.all {
        None
    } else {
        match args.page_size {
            Some(0) => {
                return Err(CommandError::Usage(
                    "--page-size must be at least 1".to_string(),
                ))
            }
            Some(size) => Some(size),
            None => Some(config.page_size),
        }
    };

    let mut view = ViewState::with_page_size(page_size);
    view.set_rarity_filter(args.rarity);
    view.set_checked_filter(args.checked);
    view.set_booster_filter(args.booster);
    view.set_sort_key(args.sort);
    view.go_to_page(args.page);
    Ok(view)
}

fn run_command(
    command: Command,
    service: &ApplicationService,
    config: &AppConfig,
) -> Result<(), CommandError> {
    match command {
        Command::Ui => ui::launch_window(service, config).map_err(CommandError::Runtime),
        Command::List(args) => {
            let view = list_view(&args, config)?;
            let cards = service
                .load_collection(LoadCollectionCommand)
                .map_err(|error| CommandError::Runtime(format!("list failed: {error}")))?;
            let derived = derive_view(&cards, &view);
            if derived.matching.is_empty() {
                println!("no cards match");
                return Ok(());
            }
            for card in &derived.page.cards {
                println!("{}", present_card_row(card));
            }
            println!("{}", present_page_footer(&derived.page, derived.matching.len()));
            Ok(())
        }
        Command::Stats => {
            let cards = service
                .load_collection(LoadCollectionCommand)
                .map_err(|error| CommandError::Runtime(format!("stats failed: {error}")))?;
            for line in present_stats(&CollectionStats::from_cards(&cards)) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Set { name, checked } => {
            service
                .save_selection(SaveSelectionCommand {
                    name: name.clone(),
                    checked,
                })
                .map_err(|error| match error {
                    ApplicationError::InvalidInput(msg) => CommandError::Usage(msg),
                    other => CommandError::Runtime(format!("set failed: {other}")),
                })?;
            println!("saved: {name} -> {}", if checked { "owned" } else { "missing" });
            Ok(())
        }
    }
}
