//! Larder CLI
//!
//! Demo frontend driving the full stack (store, engine, coordinator,
//! presenter) against a bundled fixture catalogue.
//!
//! # Commands
//!
//! - `search` - Run a paginated search and print list events per page
//! - `show` - Look up one recipe with staleness handling
//! - `categories` - Print the default category rows

use clap::{Parser, Subcommand};
use larder_api::{ApiResponse, MockRecipeApi, RecipeDto, RecipeLookupResponse, RecipeSearchResponse};
use larder_core::{MemoryRecipeStore, Resource};
use larder_search::{
    default_categories, ListEvent, ResultPresenter, Row, SearchCoordinator, QUERY_EXHAUSTED,
};
use larder_sync::{RecipeRepository, SyncConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const WAIT: Duration = Duration::from_secs(5);

/// Larder command-line demo.
#[derive(Parser)]
#[command(name = "larder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a paginated search against the fixture catalogue
    Search {
        /// Query text
        query: String,

        /// Number of pages to request
        #[arg(short, long, default_value = "3")]
        pages: u32,
    },

    /// Look up one recipe (fixture ids are f01..f16)
    Show {
        /// Recipe id
        id: String,
    },

    /// Print the default category rows
    Categories,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Search { query, pages } => run_search(&query, pages),
        Commands::Show { id } => run_show(&id),
        Commands::Categories => {
            let mut presenter = ResultPresenter::new();
            presenter.show_categories(&default_categories());
            for row in presenter.rows() {
                println!("{}", describe_row(row));
            }
            Ok(())
        }
    }
}

fn run_search(query: &str, pages: u32) -> Result<(), Box<dyn std::error::Error>> {
    let api = Arc::new(fixture_api(query));
    let store = MemoryRecipeStore::new();
    let repository = Arc::new(RecipeRepository::new(
        Arc::new(store),
        api as Arc<dyn larder_api::RecipeApi>,
        SyncConfig::default(),
    ));
    let coordinator = SearchCoordinator::new(repository);
    let results = coordinator.results();
    let mut presenter = ResultPresenter::new();

    coordinator.search(query);
    tracing::debug!(query, pages, "search submitted");
    for requested in 1..=pages {
        loop {
            let outcome = results
                .recv_timeout(WAIT)
                .map_err(|_| "request did not settle in time")?;
            let page = coordinator.state().page;
            for event in presenter.on_resource(page, &outcome) {
                println!("page {page}: {}", describe_event(&event));
            }
            match &outcome {
                Resource::Success(items) => {
                    println!("page {page}: {} item(s) presented", items.len());
                    break;
                }
                Resource::Error { message, .. } if message == QUERY_EXHAUSTED => {
                    println!("page {page}: query exhausted");
                    print_rows(presenter.rows());
                    return Ok(());
                }
                Resource::Error { message, .. } => {
                    println!("page {page}: error: {message}");
                    print_rows(presenter.rows());
                    return Ok(());
                }
                Resource::Loading(_) => continue,
            }
        }
        if requested < pages {
            coordinator.next_page();
        }
    }
    print_rows(presenter.rows());
    Ok(())
}

fn run_show(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let api = Arc::new(MockRecipeApi::new());
    api.push_lookup(lookup_fixture(id));
    let store = MemoryRecipeStore::new();
    let repository = RecipeRepository::new(
        Arc::new(store),
        api as Arc<dyn larder_api::RecipeApi>,
        SyncConfig::default(),
    );

    let stream = repository.recipe(id);
    while let Some(state) = stream.recv_timeout(WAIT) {
        match state {
            Resource::Loading(_) => println!("loading..."),
            Resource::Success(Some(recipe)) => {
                println!("{} by {}", recipe.title, recipe.publisher);
                println!("rank: {:.1}", recipe.social_rank);
                for ingredient in &recipe.ingredients {
                    println!("  - {ingredient}");
                }
                return Ok(());
            }
            Resource::Success(None) => {
                println!("no such recipe: {id}");
                return Ok(());
            }
            Resource::Error { message, .. } => {
                println!("error: {message}");
                return Ok(());
            }
        }
    }
    Err("lookup did not settle in time".into())
}

fn print_rows(rows: &[Row]) {
    println!("--- presented list ---");
    for row in rows {
        println!("{}", describe_row(row));
    }
}

fn describe_event(event: &ListEvent) -> String {
    match event {
        ListEvent::Replace(rows) => format!("replace list ({} row(s))", rows.len()),
        ListEvent::AppendLoading => "append loading row".into(),
        ListEvent::RemoveLoading => "remove loading row".into(),
        ListEvent::AppendExhausted => "append exhausted row".into(),
    }
}

fn describe_row(row: &Row) -> String {
    match row {
        Row::Recipe(recipe) => format!("  {} ({:.1}) - {}", recipe.title, recipe.social_rank, recipe.publisher),
        Row::Loading => "  [loading]".into(),
        Row::Exhausted => "  [no more results]".into(),
        Row::Category { label, image_key } => format!("  [category] {label} ({image_key})"),
    }
}

/// Builds a mock remote with two pages of themed fixtures and an empty
/// terminal page.
fn fixture_api(query: &str) -> MockRecipeApi {
    let api = MockRecipeApi::new();
    api.push_search(search_page(fixture_rows(query, 0, 10)));
    api.push_search(search_page(fixture_rows(query, 10, 6)));
    api.push_search(search_page(Vec::new()));
    api
}

fn search_page(dtos: Vec<RecipeDto>) -> ApiResponse<RecipeSearchResponse> {
    ApiResponse::Success {
        body: RecipeSearchResponse {
            count: Some(dtos.len() as u32),
            recipes: Some(dtos),
        },
    }
}

fn fixture_rows(query: &str, offset: usize, count: usize) -> Vec<RecipeDto> {
    let theme = if query.is_empty() { "House" } else { query };
    (0..count)
        .map(|i| {
            let n = offset + i + 1;
            RecipeDto {
                recipe_id: format!("f{n:02}"),
                title: format!("{theme} special no. {n}"),
                publisher: "The Fixture Kitchen".into(),
                image_url: format!("https://img.example.com/f{n:02}.jpg"),
                social_rank: 100.0 - n as f32,
                ingredients: Vec::new(),
            }
        })
        .collect()
}

fn lookup_fixture(id: &str) -> ApiResponse<RecipeLookupResponse> {
    ApiResponse::Success {
        body: RecipeLookupResponse {
            recipe: Some(RecipeDto {
                recipe_id: id.to_string(),
                title: format!("Fixture recipe {id}"),
                publisher: "The Fixture Kitchen".into(),
                image_url: format!("https://img.example.com/{id}.jpg"),
                social_rank: 87.5,
                ingredients: vec![
                    "2 cups of patience".into(),
                    "1 well-stocked larder".into(),
                    "a pinch of salt".into(),
                ],
            }),
        },
    }
}
