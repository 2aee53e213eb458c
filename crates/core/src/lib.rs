pub mod catalog;
pub mod config;
pub mod deadline;
pub mod error;
pub mod filter;
pub mod history;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod ranking;
pub mod scorer;
pub mod stores;
pub mod suggest;
pub mod traits;

pub use catalog::{load_catalog, parse_catalog};
pub use config::{EndpointConfig, EngineConfig};
pub use deadline::{Deadline, DEFAULT_COLLABORATOR_TIMEOUT};
pub use error::{CatalogError, ConfigError, FilterError, SearchError, StoreError};
pub use filter::{filter_products, filter_structural};
pub use history::{SearchHistory, MAX_HISTORY_ENTRIES};
pub use models::{
    Category, Characteristics, ImageAnalysisResponse, ImageAnalysisResult, ImageInput,
    ImageMatchMode, PriceOption, PriceRange, Product, ProductType, RoastLevel, ScoringOptions,
    SearchFilters, SearchMetadata, SearchQuery, SearchRequest, SearchResult, SearchType, SortBy,
    TranscriptionResponse,
};
pub use normalize::{suggested_names_only, terms_from_image_analysis, terms_from_voice_transcript};
pub use orchestrator::{
    analyze_image, capture_voice, ImageOutcome, LocalSearcher, RequestSequencer, RequestTicket,
    SearchCoordinator, VoiceOutcome,
};
pub use ranking::sort_products;
pub use scorer::score_products;
pub use stores::{FileBlobStore, HttpImageAnalyzer, HttpRemoteSearcher, MemoryBlobStore};
pub use suggest::{highlight, suggest, suggest_or_recent, HighlightSpan};
pub use traits::{BlobStore, ImageAnalyzer, ProductSearcher, VoiceTranscriber};
