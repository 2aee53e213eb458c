use crate::deadline::Deadline;
use crate::error::{SearchError, StoreError};
use crate::models::{
    ImageAnalysisResponse, ImageInput, Product, SearchRequest, SearchResult, TranscriptionResponse,
};
use async_trait::async_trait;

#[async_trait]
pub trait ImageAnalyzer {
    async fn analyze(
        &self,
        image: &ImageInput,
        deadline: Deadline,
    ) -> Result<ImageAnalysisResponse, SearchError>;
}

#[async_trait]
pub trait VoiceTranscriber {
    async fn transcribe(
        &self,
        locale: &str,
        deadline: Deadline,
    ) -> Result<TranscriptionResponse, SearchError>;
}

/// Implemented by both the in-process scorer and remote search backends, so
/// either can stand in for the other.
#[async_trait]
pub trait ProductSearcher {
    async fn search<'a>(
        &self,
        catalog: &'a [Product],
        request: &SearchRequest,
    ) -> Result<SearchResult<'a>, SearchError>;
}

pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
