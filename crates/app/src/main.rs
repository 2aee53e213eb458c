use async_trait::async_trait;
use brew_search_core::{
    analyze_image, highlight, load_catalog, suggest_or_recent, Deadline, EngineConfig,
    FileBlobStore, HttpImageAnalyzer, HttpRemoteSearcher, ImageAnalysisResponse, ImageAnalyzer,
    ImageInput, ImageMatchMode, ImageOutcome, PriceRange, Product, RoastLevel, SearchCoordinator,
    SearchError, SearchFilters, SearchHistory, SearchQuery, SearchRequest, SearchResult, SortBy,
};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "brew-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML configuration file (defaults to ./brew-search.toml when present)
    #[arg(long, global = true, env = "BREW_SEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog JSON file
    #[arg(long, global = true, env = "BREW_SEARCH_CATALOG", default_value = "catalog.json")]
    catalog: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Substring search with structural filters; records the query in history.
    Search {
        /// Query text
        #[arg(long)]
        text: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Relevance search over a transcript produced by a speech recognizer.
    Voice {
        #[arg(long)]
        transcript: String,
    },
    /// Relevance search from an image, analyzed remotely or read from a saved analysis.
    Image {
        /// Saved image analysis response (JSON)
        #[arg(long, conflicts_with = "image", required_unless_present = "image")]
        analysis: Option<PathBuf>,
        /// Picture to send to the configured image analysis service
        #[arg(long)]
        image: Option<PathBuf>,
        /// Match suggested names only instead of the expanded term set
        #[arg(long, default_value_t = false)]
        names_only: bool,
    },
    /// Autocomplete suggestions; recent searches when nothing is typed.
    Suggest {
        #[arg(long, default_value = "")]
        partial: String,
    },
    /// Inspect or clear recent searches.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    List,
    Clear,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long, default_value = "0")]
    min_price: f64,
    #[arg(long, default_value = "50")]
    max_price: f64,
    #[arg(long, default_value = "1")]
    min_rating: f64,
    /// Roast level filter, repeatable (light, medium, dark)
    #[arg(long = "roast")]
    roast_levels: Vec<RoastLevel>,
    /// name, price_low, price_high, rating or popularity
    #[arg(long, default_value = "popularity")]
    sort: SortBy,
}

impl FilterArgs {
    fn build(self) -> anyhow::Result<SearchFilters> {
        let price_range = PriceRange::new(self.min_price, self.max_price)?;
        Ok(SearchFilters::new(
            price_range,
            self.min_rating,
            self.roast_levels,
            self.sort,
        )?)
    }
}

/// Replays an analysis captured earlier so it goes through the same outcome rules.
struct SavedAnalysis(ImageAnalysisResponse);

#[async_trait]
impl ImageAnalyzer for SavedAnalysis {
    async fn analyze(
        &self,
        _image: &ImageInput,
        _deadline: Deadline,
    ) -> Result<ImageAnalysisResponse, SearchError> {
        Ok(self.0.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref())?;

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        remote_search = config.remote_search.is_some(),
        "brew-search boot"
    );

    let history = SearchHistory::load(FileBlobStore::new(&config.history_dir));

    let remote = match &config.remote_search {
        Some(remote) => Some(HttpRemoteSearcher::new(&remote.endpoint, remote.api_key.clone())?),
        None => None,
    };
    let coordinator = SearchCoordinator::new(remote).with_timeout(config.collaborator_timeout());

    match cli.command {
        Command::Search { text, filters } => {
            let catalog = load_catalog(&cli.catalog)?;
            let request = SearchRequest::new(SearchQuery::text(text.as_str()))
                .with_filters(filters.build()?)
                .with_options(config.scoring);

            let result = coordinator.search(&catalog, &request, coordinator.deadline()).await;
            history.record(&text);
            print_result(&result);
        }
        Command::Voice { transcript } => {
            let catalog = load_catalog(&cli.catalog)?;
            let request =
                SearchRequest::new(SearchQuery::voice(transcript)).with_options(config.scoring);

            let result = coordinator.search(&catalog, &request, coordinator.deadline()).await;
            print_result(&result);
        }
        Command::Image {
            analysis,
            image,
            names_only,
        } => {
            let catalog = load_catalog(&cli.catalog)?;
            let outcome = match (analysis, image) {
                (Some(path), _) => {
                    let saved: ImageAnalysisResponse =
                        serde_json::from_str(&std::fs::read_to_string(&path)?)?;
                    let placeholder = ImageInput {
                        bytes: Vec::new(),
                        mime_type: String::new(),
                    };
                    analyze_image(&SavedAnalysis(saved), &placeholder, coordinator.deadline()).await
                }
                (None, Some(path)) => {
                    analyze_with_service(&config, &path, coordinator.deadline()).await?
                }
                (None, None) => anyhow::bail!("either --analysis or --image is required"),
            };

            let mode = if names_only {
                ImageMatchMode::NamesOnly
            } else {
                ImageMatchMode::Expanded
            };

            match outcome {
                ImageOutcome::Results(results) => {
                    let request = SearchRequest::new(SearchQuery::image(results, mode))
                        .with_options(config.scoring);
                    let result = coordinator
                        .search(&catalog, &request, coordinator.deadline())
                        .await;
                    print_result(&result);
                }
                ImageOutcome::NotCoffeeRelated => {
                    println!("that does not look like coffee, try another picture");
                }
                ImageOutcome::Ambiguous => {
                    println!("could not tell what that is, try a clearer picture");
                }
                ImageOutcome::Failed(reason) => {
                    warn!(%reason, "image analysis failed");
                    println!("image analysis failed: {reason}");
                }
                ImageOutcome::TimedOut => {
                    println!("image analysis timed out");
                }
            }
        }
        Command::Suggest { partial } => {
            let recent = history.list();
            let catalog = if partial.trim().is_empty() {
                Vec::new()
            } else {
                load_catalog(&cli.catalog)?
            };

            let suggestions =
                suggest_or_recent(&catalog, &partial, &recent, config.max_suggestions);
            for suggestion in suggestions {
                println!("{}", render_highlight(&suggestion, &partial));
            }
        }
        Command::History { action } => match action {
            HistoryAction::List => {
                for (index, entry) in history.list().iter().enumerate() {
                    println!("{:>2}. {entry}", index + 1);
                }
            }
            HistoryAction::Clear => {
                history.clear();
                println!("search history cleared");
            }
        },
    }

    Ok(())
}

async fn analyze_with_service(
    config: &EngineConfig,
    path: &Path,
    deadline: Deadline,
) -> anyhow::Result<ImageOutcome> {
    let Some(service) = &config.image_analysis else {
        anyhow::bail!("no image_analysis endpoint configured");
    };
    let analyzer = HttpImageAnalyzer::new(&service.endpoint, service.api_key.clone())?;
    let image = ImageInput::from_path(path)?;
    Ok(analyze_image(&analyzer, &image, deadline).await)
}

fn print_result(result: &SearchResult<'_>) {
    let metadata = &result.metadata;
    println!(
        "query: {:?} type={:?} matches={}",
        metadata.original_query, metadata.search_type, metadata.total_matches
    );
    if !metadata.processed_terms.is_empty() {
        println!("terms: {}", metadata.processed_terms.join(", "));
    }

    for (rank, product) in result.products.iter().enumerate() {
        print!(
            "{:>2}. [{}] {} rating={:.1} {}",
            rank + 1,
            product.id,
            product.name,
            product.average_rating,
            price_label(product)
        );
        match result.score_of(&product.id) {
            Some(score) => println!(" score={score:.4}"),
            None => println!(),
        }
    }
}

fn price_label(product: &Product) -> String {
    match (product.min_price(), product.max_price()) {
        (Some(low), Some(high)) if (high - low).abs() > f64::EPSILON => {
            format!("price={low:.2}-{high:.2}")
        }
        (Some(low), _) => format!("price={low:.2}"),
        _ => "price=n/a".to_string(),
    }
}

fn render_highlight(text: &str, query: &str) -> String {
    highlight(text, query)
        .into_iter()
        .map(|span| {
            if span.highlighted {
                format!("[{}]", span.text)
            } else {
                span.text.to_string()
            }
        })
        .collect()
}
