use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use csv::Writer;
use next_book::{
    Book, BrowseOptions, CatalogClient, CatalogConfig, MemoryCache, SessionCache, SortMode,
    SqliteCache,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "next_book")]
#[command(author, version, about = "Browse the Open Library catalog", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// SQLite file used as the search cache (in-memory when omitted)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog
    Browse {
        #[arg(short, long)]
        query: Option<String>,

        /// Subject filter, may be repeated
        #[arg(short, long = "genre")]
        genres: Vec<String>,

        #[arg(short, long)]
        year: Option<i32>,

        /// relevance, new, old, rating, title or random
        #[arg(short, long, default_value_t = SortMode::Relevance)]
        sort: SortMode,

        #[arg(short, long, default_value_t = next_book::book::DEFAULT_LIMIT)]
        limit: u32,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Write the books to a CSV file instead of stdout
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show a single work with edition and author details
    Details { work_id: String },

    /// Books for the trending section
    Trending(SectionArgs),

    /// Books for the top rated section
    TopRated(SectionArgs),

    /// Books from a randomly picked subject
    Random(SectionArgs),
}

#[derive(clap::Args)]
struct SectionArgs {
    #[arg(short, long, default_value_t = 12)]
    limit: u32,

    /// Write the books to a CSV file instead of stdout
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Serialize)]
struct BookRow<'a> {
    key: &'a str,
    title: &'a str,
    authors: String,
    cover_id: Option<i64>,
    first_publish_year: Option<i32>,
}

fn export_file(filename: &Path, records: &[Book]) -> Result<()> {
    let mut wtr = Writer::from_path(filename)
        .with_context(|| format!("could not create {}", filename.display()))?;
    for record in records {
        wtr.serialize(BookRow {
            key: &record.key,
            title: &record.title,
            authors: record.author_name.join("; "),
            cover_id: record.cover_i,
            first_publish_year: record.first_publish_year,
        })?;
    }
    wtr.flush()?;
    info!(path = %filename.display(), count = records.len(), "wrote csv");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn emit_books(books: &[Book], csv: Option<&Path>) -> Result<()> {
    match csv {
        Some(path) => export_file(path, books),
        None => print_json(&books),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "next_book=debug"
    } else {
        "next_book=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cache: Arc<dyn SessionCache> = match &cli.cache {
        Some(path) => Arc::new(
            SqliteCache::open(path)
                .with_context(|| format!("could not open cache {}", path.display()))?,
        ),
        None => Arc::new(MemoryCache::new()),
    };
    let client = CatalogClient::with_cache(CatalogConfig::from_env(), cache)?;

    match cli.command {
        Commands::Browse {
            query,
            genres,
            year,
            sort,
            limit,
            page,
            csv,
        } => {
            let options = BrowseOptions {
                query,
                genres,
                year,
                sort,
                limit,
                page,
            };
            let result = client.browse_books(&options).await?;
            info!(total = result.total, returned = result.books.len(), "search done");
            match csv {
                Some(path) => export_file(&path, &result.books),
                None => print_json(&result),
            }
        }
        Commands::Details { work_id } => print_json(&client.get_book_details(&work_id).await?),
        Commands::Trending(args) => {
            emit_books(&client.get_trending_books(args.limit).await, args.csv.as_deref())
        }
        Commands::TopRated(args) => {
            emit_books(&client.get_top_rated_books(args.limit).await, args.csv.as_deref())
        }
        Commands::Random(args) => {
            emit_books(&client.get_random_books(args.limit).await, args.csv.as_deref())
        }
    }
}
