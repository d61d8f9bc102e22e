mod render;

use std::path::PathBuf;
use std::sync::Arc;

use artworks_common::{RequestTokens, SortKey};
use artworks_core::collection::{ItemRef, ListFilter};
use artworks_core::config::Config;
use artworks_core::favorites::{AddOutcome, FavoritesStore, FileStore};
use artworks_core::gallery::{Gallery, GalleryError};
use artworks_core::view::{failure_message, DetailState, ExploreState, ViewStatus};
use clap::{Parser, Subcommand};
use tracing::{error, info};

/// Browse public museum collections from the terminal.
#[derive(Parser)]
#[command(name = "artworks")]
struct Args {
    /// Path to a YAML config file.
    #[arg(long, env = "ARTWORKS_CONFIG")]
    config: Option<PathBuf>,

    /// Max detail lookups in flight at once.
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Directory holding the favorites file.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the collection's departments.
    Departments,
    /// Browse one page of a department or search.
    Explore {
        #[arg(long, default_value_t = 11)]
        department: u32,
        /// Free-text query within the department.
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// date, title or artist
        #[arg(long, default_value_t = SortKey::Date)]
        sort: SortKey,
    },
    /// Show one artwork.
    Show {
        id: ItemRef,
        /// Also add it to favorites.
        #[arg(long)]
        favorite: bool,
    },
    /// Search the collection.
    Search { query: String },
    /// A handful of artworks with images.
    Highlights,
    /// Search the MET and the Smithsonian together.
    Exhibition { query: String },
    /// List or edit favorites.
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesCommand>,
    },
}

#[derive(Subcommand)]
enum FavoritesCommand {
    List,
    Remove { id: ItemRef },
}

fn configure_logging() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .with_target(false)
        .with_file(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn exit_with(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn load_config(args: &Args) -> Config {
    let mut config = Config::load(args.config.as_deref()).unwrap_or_else(|e| {
        error!("Failed to load config: {e}");
        std::process::exit(1);
    });
    if let Some(max_concurrent) = args.max_concurrent {
        config.max_concurrent = max_concurrent;
    }
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    }
    config
}

fn open_favorites(config: &Config) -> FavoritesStore {
    FavoritesStore::open(Arc::new(FileStore::new(config.data_dir.clone())))
}

fn report_gallery_error(e: GalleryError) -> ! {
    match e {
        GalleryError::EmptyQuery => exit_with(&e.to_string()),
        GalleryError::Collection(e) => {
            error!("Collection request failed: {e}");
            exit_with(failure_message(&e));
        }
    }
}

#[tokio::main]
async fn main() {
    configure_logging();
    let args = Args::parse();
    let config = load_config(&args);

    let gallery = Gallery::from_config(&config).unwrap_or_else(|e| {
        error!("Failed to set up collection client: {e}");
        exit_with(failure_message(&e));
    });

    match args.command {
        Command::Departments => {
            let departments = gallery.departments().await.unwrap_or_else(|e| {
                error!("Failed to load departments: {e}");
                exit_with("Failed to load departments.");
            });
            print!("{}", render::departments(&departments));
        }
        Command::Explore {
            department,
            query,
            page,
            sort,
        } => {
            let filter = ListFilter {
                department: Some(department),
                query,
                has_images: false,
            };
            let state = explore(&gallery, filter, sort, page).await;
            print!("{}", render::explore(&state));
            if matches!(state.status, ViewStatus::Failed(_)) {
                std::process::exit(1);
            }
        }
        Command::Show { id, favorite } => {
            let mut favorites = open_favorites(&config);
            let result = gallery.fetch_detail(id).await;
            if let Err(e) = &result {
                error!("Failed to load artwork {id}: {e}");
            }
            let mut state = DetailState::loaded(result, favorites.set());

            if favorite {
                if let Some(item) = &state.item {
                    match favorites.add(item.clone()) {
                        Ok(AddOutcome::Added) => {
                            state.is_favorite = true;
                            println!("Artwork added to favorites!");
                        }
                        Ok(AddOutcome::AlreadyPresent) => {
                            println!("Artwork is already in favorites.")
                        }
                        Err(e) => {
                            error!("Failed to save favorites: {e}");
                            exit_with("Could not save favorites.");
                        }
                    }
                }
            }

            print!("{}", render::detail(&state));
            if matches!(state.status, ViewStatus::Failed(_)) {
                std::process::exit(1);
            }
        }
        Command::Search { query } => {
            let outcome = gallery
                .search(&query)
                .await
                .unwrap_or_else(|e| report_gallery_error(e));
            print!("{}", render::cards(&outcome.items));
        }
        Command::Highlights => {
            let outcome = gallery.highlights().await.unwrap_or_else(|e| {
                error!("Failed to load highlights: {e}");
                exit_with(failure_message(&e));
            });
            print!("{}", render::cards(&outcome.items));
        }
        Command::Exhibition { query } => {
            let results = gallery
                .exhibition(&query)
                .await
                .unwrap_or_else(|e| report_gallery_error(e));
            print!("{}", render::exhibition(&results));
        }
        Command::Favorites { action } => {
            let mut favorites = open_favorites(&config);
            match action.unwrap_or(FavoritesCommand::List) {
                FavoritesCommand::List => print!("{}", render::favorites(favorites.items())),
                FavoritesCommand::Remove { id } => match favorites.remove(id) {
                    Ok(true) => println!("Artwork removed from favorites!"),
                    Ok(false) => println!("Artwork {id} is not in favorites."),
                    Err(e) => {
                        error!("Failed to save favorites: {e}");
                        exit_with("Could not save favorites.");
                    }
                },
            }
        }
    }
}

/// List refs for `filter`, then load `page` of them.
async fn explore(gallery: &Gallery, filter: ListFilter, sort: SortKey, page: usize) -> ExploreState {
    let mut tokens = RequestTokens::new();
    let state = ExploreState::new(filter, sort, gallery.limits().page_size);

    let (state, token) = state.begin_listing(&mut tokens);
    let refs = gallery.list_refs(&state.filter).await;
    if let Err(e) = &refs {
        error!("Failed to list artworks: {e}");
    }
    let state = state.refs_loaded(token, refs);
    if matches!(state.status, ViewStatus::Failed(_) | ViewStatus::Empty) {
        return state;
    }
    info!("{} artwork(s) listed", state.refs.len());

    let (state, token, window) = state.begin_page(page, &mut tokens);
    let outcome = gallery.fetch_page(&state.refs, window).await;
    if let Err(e) = &outcome {
        error!("Failed to load page {}: {e}", state.page);
    }
    state.page_loaded(token, outcome)
}
