use crate::deadline::Deadline;
use crate::filter::{filter_products, filter_structural};
use crate::models::{
    ImageAnalysisResult, ImageInput, ImageMatchMode, Product, SearchMetadata, SearchQuery,
    SearchRequest, SearchResult, SearchType,
};
use crate::ranking::sort_products;
use crate::scorer::score_candidates;
use crate::traits::{ImageAnalyzer, ProductSearcher, VoiceTranscriber};
use crate::SearchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// In-process search: filter and sort for text, normalize and score otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSearcher;

#[async_trait]
impl ProductSearcher for LocalSearcher {
    async fn search<'a>(
        &self,
        catalog: &'a [Product],
        request: &SearchRequest,
    ) -> Result<SearchResult<'a>, SearchError> {
        Ok(local_search(catalog, request))
    }
}

pub fn local_search<'a>(catalog: &'a [Product], request: &SearchRequest) -> SearchResult<'a> {
    match &request.query {
        SearchQuery::Text { text } => {
            let filters = request.filters.clone().unwrap_or_default();
            let filtered = filter_products(catalog, &filters, text);
            let products = sort_products(&filtered, filters.sort_by());

            SearchResult {
                metadata: SearchMetadata {
                    search_type: SearchType::Text,
                    original_query: request.query.original_query(),
                    processed_terms: request.query.terms(),
                    total_matches: products.len(),
                },
                products,
                scores: HashMap::new(),
            }
        }
        query => {
            let terms = query.terms();
            let candidates: Vec<&'a Product> = match &request.filters {
                Some(filters) => filter_structural(catalog, filters),
                None => catalog.iter().collect(),
            };

            score_candidates(
                &candidates,
                &terms,
                query.search_type(),
                &query.original_query(),
                &request.options,
            )
        }
    }
}

/// Substring filtering over whatever raw text the query carries.
pub fn fallback_search<'a>(catalog: &'a [Product], request: &SearchRequest) -> SearchResult<'a> {
    let raw_text = request.query.raw_text();
    let filters = request.filters.clone().unwrap_or_default();
    let filtered = filter_products(catalog, &filters, &raw_text);
    let products = sort_products(&filtered, filters.sort_by());

    SearchResult {
        metadata: SearchMetadata {
            search_type: SearchType::Fallback,
            original_query: request.query.original_query(),
            processed_terms: if raw_text.is_empty() {
                Vec::new()
            } else {
                vec![raw_text]
            },
            total_matches: products.len(),
        },
        products,
        scores: HashMap::new(),
    }
}

pub struct SearchCoordinator<R = LocalSearcher>
where
    R: ProductSearcher,
{
    remote: Option<R>,
    collaborator_timeout: Duration,
}

impl SearchCoordinator<LocalSearcher> {
    pub fn local() -> Self {
        Self {
            remote: None,
            collaborator_timeout: crate::deadline::DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }
}

impl<R> SearchCoordinator<R>
where
    R: ProductSearcher + Send + Sync,
{
    pub fn new(remote: Option<R>) -> Self {
        Self {
            remote,
            collaborator_timeout: crate::deadline::DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.collaborator_timeout)
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Never fails: remote errors fall back to the local path, a missed
    /// deadline falls back to plain substring filtering.
    pub async fn search<'a>(
        &self,
        catalog: &'a [Product],
        request: &SearchRequest,
        deadline: Deadline,
    ) -> SearchResult<'a> {
        let Some(remote) = &self.remote else {
            return local_search(catalog, request);
        };

        match deadline.run("remote search", remote.search(catalog, request)).await {
            Ok(result) => {
                debug!(
                    matches = result.metadata.total_matches,
                    returned = result.products.len(),
                    "remote search answered"
                );
                result
            }
            Err(SearchError::DeadlineExceeded { collaborator }) => {
                warn!(%collaborator, "deadline exceeded, filtering raw query text locally");
                fallback_search(catalog, request)
            }
            Err(error) => {
                warn!(%error, "remote search failed, scoring locally");
                local_search(catalog, request)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceOutcome {
    Transcript(String),
    /// Recognizer succeeded but heard nothing usable.
    Empty,
    Failed(String),
    TimedOut,
}

impl VoiceOutcome {
    pub fn into_query(self) -> Option<SearchQuery> {
        match self {
            VoiceOutcome::Transcript(transcript) => Some(SearchQuery::voice(transcript)),
            _ => None,
        }
    }
}

pub async fn capture_voice<T>(transcriber: &T, locale: &str, deadline: Deadline) -> VoiceOutcome
where
    T: VoiceTranscriber + Sync,
{
    match deadline
        .run("voice transcription", transcriber.transcribe(locale, deadline))
        .await
    {
        Ok(response) if response.success => match response.transcript {
            Some(transcript) if !transcript.trim().is_empty() => {
                VoiceOutcome::Transcript(transcript.trim().to_string())
            }
            _ => VoiceOutcome::Empty,
        },
        Ok(response) => VoiceOutcome::Failed(
            response
                .error
                .unwrap_or_else(|| "voice transcription failed".to_string()),
        ),
        Err(SearchError::DeadlineExceeded { .. }) => VoiceOutcome::TimedOut,
        Err(error) => VoiceOutcome::Failed(error.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    Results(Vec<ImageAnalysisResult>),
    /// The analyzer recognized the picture as something other than coffee.
    NotCoffeeRelated,
    /// Analysis succeeded without any usable result.
    Ambiguous,
    Failed(String),
    TimedOut,
}

impl ImageOutcome {
    pub fn into_query(self, mode: ImageMatchMode) -> Option<SearchQuery> {
        match self {
            ImageOutcome::Results(results) => Some(SearchQuery::image(results, mode)),
            _ => None,
        }
    }

    pub fn prompts_retry(&self) -> bool {
        matches!(self, ImageOutcome::NotCoffeeRelated | ImageOutcome::Ambiguous)
    }
}

pub async fn analyze_image<A>(analyzer: &A, image: &ImageInput, deadline: Deadline) -> ImageOutcome
where
    A: ImageAnalyzer + Sync,
{
    let response = match deadline
        .run("image analysis", analyzer.analyze(image, deadline))
        .await
    {
        Ok(response) => response,
        Err(SearchError::DeadlineExceeded { .. }) => return ImageOutcome::TimedOut,
        Err(error) => return ImageOutcome::Failed(error.to_string()),
    };

    if response.is_coffee_related == Some(false) {
        return ImageOutcome::NotCoffeeRelated;
    }
    if !response.success {
        return ImageOutcome::Failed(
            response
                .error
                .unwrap_or_else(|| "image analysis failed".to_string()),
        );
    }
    if response.results.is_empty() {
        return ImageOutcome::Ambiguous;
    }
    ImageOutcome::Results(response.results)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

/// Numbers dispatched searches so late responses can be recognized and dropped.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}
