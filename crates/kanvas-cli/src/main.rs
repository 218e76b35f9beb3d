use clap::{Parser, Subcommand};
use kanvas_core::{AssetRegistry, AssetTree, BookId, KanvasConfig, TagStore};
use kanvas_library::{Book, BookStore, NewBook, Workspace};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Inspect and create kanvas library files
#[derive(Parser)]
#[command(name = "kanvas", version, about = "Inspect and create kanvas library files")]
struct Cli {
    /// RON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the worlds in a library file
    Books { file: PathBuf },
    /// Print the asset tree of a world
    Tree {
        file: PathBuf,
        /// Book id, defaults to the first book
        #[arg(long)]
        book: Option<String>,
        /// Show every level instead of root assets only
        #[arg(long)]
        expand_all: bool,
    },
    /// Find assets by name
    Search {
        file: PathBuf,
        query: String,
        #[arg(long)]
        book: Option<String>,
    },
    /// Verify parent/child consistency of every world
    Check { file: PathBuf },
    /// Write a new library with one empty world
    New {
        file: PathBuf,
        #[arg(long)]
        title: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<ExitCode> {
    let config = match &cli.config {
        Some(path) => KanvasConfig::load(path)?,
        None => KanvasConfig::default(),
    };
    debug!("config: {:?}", config);

    match cli.command {
        Commands::Books { file } => {
            let store = BookStore::open(&file)?;
            if store.is_empty() {
                println!("(no books)");
            }
            for book in store.books() {
                println!(
                    "{}  {:<24} {:>4} assets {:>3} tags",
                    book.id,
                    book.title,
                    book.asset_count(),
                    book.tag_count()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tree {
            file,
            book,
            expand_all,
        } => {
            let store = BookStore::open(&file)?;
            let book = pick_book(&store, book.as_deref())?;
            let (registry, tags) = load_world(&config, book);

            let mut tree = AssetTree::new();
            if expand_all {
                tree.expand_all(&registry);
            }
            println!("{}", book.title);
            for (level, asset) in tree.flattened(&registry) {
                let tag_names: Vec<String> = tags
                    .tags_for_asset(asset.id())
                    .iter()
                    .map(|t| format!("#{}", t.name))
                    .collect();
                let marker = if asset.children().is_empty() || tree.is_expanded(asset.id()) {
                    " "
                } else {
                    "+"
                };
                println!(
                    "{}{}{} [{:?}] {}",
                    "  ".repeat(level + 1),
                    marker,
                    asset.name,
                    asset.kind,
                    tag_names.join(" ")
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Search { file, query, book } => {
            let store = BookStore::open(&file)?;
            let book = pick_book(&store, book.as_deref())?;
            let (registry, _) = load_world(&config, book);

            let hits = registry.search(&query);
            if hits.is_empty() {
                println!("no match for {:?}", query);
            }
            for asset in hits {
                let path: Vec<&str> = registry
                    .asset_path(asset.id())
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect();
                println!("{}  {}", asset.id(), path.join(" / "));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { file } => {
            let store = BookStore::open(&file)?;
            let mut problems = 0;
            for book in store.books() {
                let (registry, _) = load_world(&config, book);
                let issues = registry.check_integrity();
                if issues.is_empty() {
                    println!("{}: ok ({} assets)", book.title, registry.len());
                    continue;
                }
                problems += issues.len();
                println!("{}: {} problem(s)", book.title, issues.len());
                for issue in issues {
                    println!("  {:?}", issue);
                }
            }
            Ok(if problems == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::New { file, title, force } => {
            create_library(&config, &file, title, force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn pick_book<'a>(store: &'a BookStore, id: Option<&str>) -> CliResult<&'a Book> {
    let book = match id {
        Some(id) => store.get(&BookId::new(id)),
        None => store.books().next(),
    };
    book.ok_or_else(|| match id {
        Some(id) => format!("no book with id {id}").into(),
        None => "library has no books".into(),
    })
}

fn load_world(config: &KanvasConfig, book: &Book) -> (AssetRegistry, TagStore) {
    let mut registry = AssetRegistry::with_config(config);
    let mut tags = TagStore::new();
    book.world_data.clone().load_into(&mut registry, &mut tags);
    (registry, tags)
}

fn create_library(config: &KanvasConfig, file: &Path, title: String, force: bool) -> CliResult<()> {
    if file.exists() && !force {
        return Err(format!("{} exists, pass --force to overwrite", file.display()).into());
    }
    let mut workspace = Workspace::with_config(config.clone());
    let id = workspace.create_world(NewBook::new(title));
    workspace.save_to(file)?;
    info!("created book {} in {}", id, file.display());
    println!("{}", id);
    Ok(())
}
